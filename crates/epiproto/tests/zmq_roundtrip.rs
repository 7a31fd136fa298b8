//! DEALER/ROUTER roundtrip of grid-updates frames over tmq

use futures::{SinkExt, StreamExt};
use epiproto::socket_config::{
    create_dealer_and_connect, create_router_and_bind, single_frame, Multipart, ZmqContext,
};
use epiproto::{wire, ChannelFrame, SimulationId, StreamMessage};
use serde_json::json;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

static PORT: AtomicU16 = AtomicU16::new(17690);

fn next_endpoint() -> String {
    let port = PORT.fetch_add(1, Ordering::SeqCst);
    format!("tcp://127.0.0.1:{}", port)
}

fn multipart_to_frames(mp: Multipart) -> Vec<Vec<u8>> {
    mp.into_iter().map(|m| m.to_vec()).collect()
}

#[tokio::test]
async fn test_subscribe_then_receive_grid_data() {
    let endpoint = next_endpoint();

    let router_ctx = ZmqContext::new();
    let router = create_router_and_bind(&router_ctx, &endpoint, "producer").unwrap();
    let (mut router_tx, mut router_rx) = router.split();

    let dealer_ctx = ZmqContext::new();
    let dealer = create_dealer_and_connect(&dealer_ctx, &endpoint, b"viewer-1", "viewer").unwrap();
    let (mut dealer_tx, mut dealer_rx) = dealer.split();

    // Give sockets time to connect
    tokio::time::sleep(Duration::from_millis(100)).await;

    let handshake = ChannelFrame::subscribe(&SimulationId::new("42"));
    dealer_tx
        .send(single_frame(wire::encode(&handshake).unwrap()))
        .await
        .unwrap();

    // ROUTER receives [identity][payload]
    let received = tokio::time::timeout(Duration::from_secs(2), router_rx.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let frames = multipart_to_frames(received);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], b"viewer-1".to_vec());

    let decoded = wire::decode(&frames[1]).unwrap();
    assert_eq!(decoded.subscription_id(), Some(SimulationId::new("42")));

    let payload = ChannelFrame::grid_data(json!({"grid_size": 5}));
    let reply: Multipart = vec![frames[0].clone(), wire::encode(&payload).unwrap()].into();
    router_tx.send(reply).await.unwrap();

    // DEALER receives payload only (identity stripped by libzmq)
    let received = tokio::time::timeout(Duration::from_secs(2), dealer_rx.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let frames = multipart_to_frames(received);
    assert_eq!(frames.len(), 1);

    let frame = wire::decode(&frames[0]).unwrap();
    match StreamMessage::from_frame(frame) {
        StreamMessage::Metadata(grid) => assert_eq!(grid.grid_size, 5),
        other => panic!("expected metadata, got {:?}", other),
    }
}
