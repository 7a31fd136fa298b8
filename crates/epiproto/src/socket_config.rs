//! Centralized ZMQ socket configuration for the grid-updates channel
//!
//! All socket setup goes through these helpers so viewer and test producers
//! share one set of options.
//!
//! - `LINGER` set to 0 for clean shutdown
//! - `RECONNECT_IVL` set to 1s for responsive reconnection
//! - `RECONNECT_IVL_MAX` capped at 60s to prevent runaway backoff

use anyhow::{Context, Result};
use tmq::dealer::Dealer;
use tmq::router::Router;
use tracing::debug;

pub use tmq::{Context as ZmqContext, Multipart, TmqError};

/// Default reconnect interval in milliseconds
pub const DEFAULT_RECONNECT_IVL_MS: i32 = 1000;

/// Maximum reconnect interval in milliseconds (60 seconds)
pub const DEFAULT_RECONNECT_IVL_MAX_MS: i32 = 60_000;

/// Create a DEALER socket with routing identity and connect it.
///
/// ZMQ connects lazily: this succeeds even when nothing is listening yet.
pub fn create_dealer_and_connect(
    ctx: &ZmqContext,
    endpoint: &str,
    identity: &[u8],
    name: &str,
) -> Result<Dealer> {
    let socket = tmq::dealer(ctx)
        .set_linger(0)
        .set_reconnect_ivl(DEFAULT_RECONNECT_IVL_MS)
        .set_reconnect_ivl_max(DEFAULT_RECONNECT_IVL_MAX_MS)
        .set_identity(identity)
        .connect(endpoint)
        .with_context(|| format!("Failed to connect {} socket to {}", name, endpoint))?;

    debug!("{}: DEALER connected to {}", name, endpoint);
    Ok(socket)
}

/// Create a ROUTER socket and bind it. Used by producers and test harnesses.
pub fn create_router_and_bind(ctx: &ZmqContext, endpoint: &str, name: &str) -> Result<Router> {
    let socket = tmq::router(ctx)
        .set_linger(0)
        .bind(endpoint)
        .with_context(|| format!("Failed to bind {} ROUTER socket to {}", name, endpoint))?;

    debug!("{}: ROUTER bound to {}", name, endpoint);
    Ok(socket)
}

/// Single-frame multipart message.
pub fn single_frame(bytes: Vec<u8>) -> Multipart {
    Multipart::from(vec![bytes])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_RECONNECT_IVL_MS, 1000);
        assert_eq!(DEFAULT_RECONNECT_IVL_MAX_MS, 60_000);
        assert!(DEFAULT_RECONNECT_IVL_MAX_MS > DEFAULT_RECONNECT_IVL_MS);
    }

    #[test]
    fn test_single_frame() {
        let mp = single_frame(b"{}".to_vec());
        assert_eq!(mp.into_iter().count(), 1);
    }
}
