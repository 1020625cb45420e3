use thiserror::Error;

/// A failure reported by the broker transport.
///
/// `Clone` so the writer can hand the same value to every caller while the
/// connection stays degraded. Transports flatten their own error types into
/// these variants (usually via `to_string()`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    // ── Session ─────────────────────────────────────────────────────
    /// TCP connect / handshake failed (refused, DNS failure, reset).
    #[error("Connection to {endpoint} failed: {reason}")]
    Refused { endpoint: String, reason: String },

    /// The broker rejected the ident/secret pair.
    #[error("Authentication rejected for ident '{ident}': {message}")]
    Authentication { ident: String, message: String },

    /// The session dropped and has not been re-established yet.
    #[error("Broker connection lost")]
    Disconnected,

    // ── Publish ─────────────────────────────────────────────────────
    /// Sending a payload over the live session failed.
    #[error("Publish to channel '{channel}' failed: {reason}")]
    Publish { channel: String, reason: String },

    /// Raw I/O failure from the transport.
    #[error("Broker I/O error: {0}")]
    Io(String),
}

impl ConnectionError {
    /// Returns `true` if retrying with the same credentials can never succeed.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// The initial connect attempt failed; no writer was created and no
/// background task was started.
#[derive(Debug, Error)]
#[error("Could not establish broker session with {endpoint}")]
pub struct ConstructionError {
    pub endpoint: String,
    #[source]
    pub source: ConnectionError,
}

/// Outcome of a [`PublishWriter::write`](crate::PublishWriter::write) that
/// did not complete cleanly.
#[derive(Debug, Clone, Error)]
pub enum WriteError {
    /// The payload was queued, but the broker connection is currently
    /// degraded. The caller decides whether to retry or drop.
    #[error("Queued {queued} bytes but the broker connection is degraded: {cause}")]
    Degraded {
        queued: usize,
        #[source]
        cause: ConnectionError,
    },

    /// The writer was shut down; nothing was queued.
    #[error("Publish writer has shut down")]
    Closed,
}

impl WriteError {
    /// Number of bytes that made it onto the publish channel.
    pub fn queued(&self) -> usize {
        match self {
            Self::Degraded { queued, .. } => *queued,
            Self::Closed => 0,
        }
    }

    /// The connection error observed at write time, if any.
    pub fn cause(&self) -> Option<&ConnectionError> {
        match self {
            Self::Degraded { cause, .. } => Some(cause),
            Self::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_write_reports_queued_bytes() {
        let err = WriteError::Degraded {
            queued: 42,
            cause: ConnectionError::Disconnected,
        };
        assert_eq!(err.queued(), 42);
        assert_eq!(err.cause(), Some(&ConnectionError::Disconnected));
        assert_eq!(
            err.to_string(),
            "Queued 42 bytes but the broker connection is degraded: Broker connection lost"
        );
    }

    #[test]
    fn closed_write_queues_nothing() {
        assert_eq!(WriteError::Closed.queued(), 0);
        assert!(WriteError::Closed.cause().is_none());
    }

    #[test]
    fn io_errors_flatten_to_strings() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset");
        let err = ConnectionError::from(io);
        assert_eq!(err, ConnectionError::Io("peer reset".into()));
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn construction_error_keeps_source() {
        let err = ConstructionError {
            endpoint: "127.0.0.1:10000".into(),
            source: ConnectionError::Authentication {
                ident: "sensor-1".into(),
                message: "bad secret".into(),
            },
        };
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("Authentication rejected for ident 'sensor-1': bad secret")
        );
        assert!(err.source.is_auth_failure());
    }
}
