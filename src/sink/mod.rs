//! Reply dispatch
//!
//! A sink delivers a reply into the live conversation. Delivery is best
//! effort: `send` reports failure as `false` and logs the cause.

mod applescript;

use async_trait::async_trait;

pub use applescript::{AppleScriptSink, DEFAULT_SEND_TIMEOUT, build_send_script, escape_applescript};

/// Delivers replies to the correspondent
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Send `text`, returning whether delivery succeeded
    async fn send(&self, text: &str) -> bool;

    /// Sink name for logs
    fn name(&self) -> &'static str;
}

/// Sink that only logs what it would have sent
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSink;

#[async_trait]
impl ReplySink for DryRunSink {
    async fn send(&self, text: &str) -> bool {
        tracing::info!(chars = text.len(), "dry run, reply not dispatched");
        true
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
