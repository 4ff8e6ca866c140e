use async_trait::async_trait;
use tracing::info;

/// Receives a screenshot captured when a resolution gives up.
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    async fn record_failure(&self, description: &str, screenshot: Vec<u8>);
}

/// Logs the capture and discards it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl DiagnosticSink for TracingSink {
    async fn record_failure(&self, description: &str, screenshot: Vec<u8>) {
        info!(
            element = description,
            bytes = screenshot.len(),
            "Captured failure screenshot"
        );
    }
}
