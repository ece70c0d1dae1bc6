//! Error types for the call bridge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Transport unreachable, or the retry budget was exhausted.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The host-side operation itself failed. The original message is
    /// preserved across the wire.
    #[error("host operation failed: {message}")]
    RemoteExecution { message: String },

    /// The target locator no longer resolves to a live host entity.
    #[error("no live host entity for {locator}")]
    LocatorResolution { locator: String },

    /// A value could not be represented on the wire or extracted from a
    /// response.
    #[error("unsupported type: {context}")]
    UnsupportedType { context: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl BridgeError {
    /// Whether retrying over a fresh transport could plausibly succeed.
    ///
    /// Host-reported failures are never transient: retrying a logically
    /// failed or stale operation would not change the outcome.
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::Connection(_) | BridgeError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_preserves_host_message() {
        let err = BridgeError::RemoteExecution {
            message: "Can't undo.".to_string(),
        };
        assert!(err.to_string().contains("Can't undo."));
    }

    #[test]
    fn test_transient_classification() {
        assert!(BridgeError::Connection("refused".into()).is_transient());
        assert!(BridgeError::Io(std::io::Error::other("pipe")).is_transient());
        assert!(!BridgeError::RemoteExecution {
            message: "x".into()
        }
        .is_transient());
        assert!(!BridgeError::LocatorResolution {
            locator: "track:t1".into()
        }
        .is_transient());
        assert!(!BridgeError::UnsupportedType {
            context: "x".into()
        }
        .is_transient());
    }
}
