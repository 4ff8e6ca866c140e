use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::descriptor::Strategy;

/// Opaque reference to a live element issued by a [`RemoteSession`].
///
/// Cloning is cheap; two handles are equal when they point at the same remote
/// element reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(Arc<str>);

impl ElementHandle {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// True when both handles share the same allocation, i.e. one is a clone
    /// of the other rather than a fresh lookup that happened to match.
    pub fn same_instance(&self, other: &ElementHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Element {0} is stale")]
    StaleElement(String),

    #[error("Invalid selector: {selector}")]
    InvalidSelector { selector: String },

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Session not ready")]
    NotReady,

    #[error("Timeout")]
    Timeout,

    #[error("Other: {0}")]
    Other(String),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Transport(_) => "TRANSPORT_ERROR",
            SessionError::StaleElement(_) => "ELEMENT_STALE",
            SessionError::InvalidSelector { .. } => "SELECTOR_INVALID",
            SessionError::NotSupported(_) => "NOT_SUPPORTED",
            SessionError::NotReady => "NOT_READY",
            SessionError::Timeout => "TIMEOUT",
            SessionError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionError::Transport(_)
                | SessionError::StaleElement(_)
                | SessionError::Timeout
                | SessionError::Other(_)
        )
    }
}

/// The device-automation transport the resolver sits on top of.
///
/// Implementations speak whatever wire protocol they like (WebDriver, a
/// vendor grid, an in-memory fake). All methods take `&self` so a single
/// session can serve concurrent lookups.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Locate an element, waiting up to `timeout`.
    /// Returns `Ok(None)` when nothing matched within the window.
    async fn locate(
        &self,
        strategy: Strategy,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, SessionError>;

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, SessionError>;

    async fn click(&self, handle: &ElementHandle) -> Result<(), SessionError>;

    async fn text(&self, handle: &ElementHandle) -> Result<String, SessionError>;

    async fn set_value(&self, handle: &ElementHandle, text: &str) -> Result<(), SessionError>;

    async fn clear(&self, handle: &ElementHandle) -> Result<(), SessionError>;

    /// Capture the current screen. Only used for failure diagnostics.
    async fn screenshot(&self) -> Result<Vec<u8>, SessionError>;

    /// Cooperative pause used between retries.
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// The resolver no longer holds `handle`; sessions that track issued
    /// handles may forget it.
    fn release(&self, _handle: &ElementHandle) {}
}
