//! StreamSession over a real DEALER/ROUTER pair

mod common;

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use common::{end_payload, grid_payload, snapshot_payload};
use epiconf::PlaybackConfig;
use epiproto::socket_config::{create_router_and_bind, Multipart, ZmqContext};
use epiproto::{wire, ChannelFrame, SimulationId};
use epiview::{Channel, SessionEvent, SessionStatus, StreamSession, ZmqChannel};
use futures::{SinkExt, StreamExt};
use serde_json::Value;

static PORT: AtomicU16 = AtomicU16::new(17790);

fn next_endpoint() -> String {
    let port = PORT.fetch_add(1, Ordering::SeqCst);
    format!("tcp://127.0.0.1:{}", port)
}

async fn next_event(session: &mut StreamSession) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(2), session.next_event())
        .await
        .expect("no event within 2s")
}

#[tokio::test]
async fn test_session_over_zmq() {
    let endpoint = next_endpoint();

    let ctx = ZmqContext::new();
    let router = create_router_and_bind(&ctx, &endpoint, "producer").unwrap();
    let (mut router_tx, mut router_rx) = router.split();

    let channel = ZmqChannel::connect(&endpoint, b"epiview-test").unwrap();
    assert_eq!(channel.endpoint(), endpoint);
    let mut session = StreamSession::open(channel, SimulationId::new("77"), PlaybackConfig::default())
        .await
        .unwrap();

    let subscribe = tokio::time::timeout(Duration::from_secs(2), router_rx.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let frames: Vec<Vec<u8>> = subscribe.into_iter().map(|m| m.to_vec()).collect();
    assert_eq!(frames[0], b"epiview-test".to_vec());
    let handshake = wire::decode(&frames[1]).unwrap();
    assert_eq!(handshake.subscription_id(), Some(SimulationId::new("77")));

    let identity = frames[0].clone();
    let payloads: Vec<Value> = vec![
        grid_payload(5),
        snapshot_payload(0, 3),
        snapshot_payload(1, 3),
        end_payload(),
    ];
    for payload in payloads {
        let bytes = wire::encode(&ChannelFrame::grid_data(payload)).unwrap();
        let reply: Multipart = vec![identity.clone(), bytes].into();
        router_tx.send(reply).await.unwrap();
    }

    assert_eq!(next_event(&mut session).await, SessionEvent::MetadataStored);
    assert_eq!(
        next_event(&mut session).await,
        SessionEvent::SnapshotAppended { index: 0 }
    );
    assert_eq!(
        next_event(&mut session).await,
        SessionEvent::SnapshotAppended { index: 1 }
    );
    assert_eq!(next_event(&mut session).await, SessionEvent::Ended);

    assert_eq!(session.status(), SessionStatus::Exhausted);
    assert_eq!(session.state().buffer().len(), 2);
    assert!(!session.is_open());
}

#[tokio::test]
async fn test_garbage_frame_is_discarded() {
    let endpoint = next_endpoint();

    let ctx = ZmqContext::new();
    let router = create_router_and_bind(&ctx, &endpoint, "producer").unwrap();
    let (mut router_tx, mut router_rx) = router.split();

    let channel = ZmqChannel::connect(&endpoint, b"epiview-garbage").unwrap();
    let mut session = StreamSession::open(channel, SimulationId::new("78"), PlaybackConfig::default())
        .await
        .unwrap();

    let subscribe = tokio::time::timeout(Duration::from_secs(2), router_rx.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let identity = subscribe.into_iter().next().unwrap().to_vec();

    let garbage: Multipart = vec![identity.clone(), b"not json".to_vec()].into();
    router_tx.send(garbage).await.unwrap();
    let grid = wire::encode(&ChannelFrame::grid_data(grid_payload(4))).unwrap();
    let reply: Multipart = vec![identity, grid].into();
    router_tx.send(reply).await.unwrap();

    assert!(matches!(
        next_event(&mut session).await,
        SessionEvent::Discarded { .. }
    ));
    assert_eq!(next_event(&mut session).await, SessionEvent::MetadataStored);
    assert_eq!(session.status(), SessionStatus::Live);
    assert!(session.is_open());
}

#[tokio::test]
async fn test_close_releases_sockets() {
    let endpoint = next_endpoint();
    let mut channel = ZmqChannel::connect(&endpoint, b"epiview-close").unwrap();
    assert!(!channel.is_closed());

    channel.close();
    channel.close();

    assert!(channel.is_closed());
    assert!(channel.recv().await.is_none());
    assert!(channel
        .send(ChannelFrame::grid_data(Value::Null))
        .await
        .is_err());
}
