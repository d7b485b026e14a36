//! Error types shared across the crate

use crate::game::EventKind;

/// Failures reported by a transport collaborator.
///
/// None of these are retried by the controller; the caller decides whether
/// and when to re-attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("listener for '{0}' registered after ready()")]
    ListenerAfterReady(EventKind),

    #[error("transport used before ready()")]
    NotReady,

    #[error("host SDK is not available")]
    Unavailable,

    #[error("host rejected the request: {0}")]
    Rejected(String),

    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// Failures while loading or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Failures while building an outgoing [`SyncState`](crate::sync::SyncState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("no player roster received yet")]
    MissingRoster,
}
