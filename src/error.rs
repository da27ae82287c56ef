use thiserror::Error;

/// Fault taxonomy for the error-reporting path.
///
/// Every broker-facing collaborator classifies its failures into one of these
/// variants at the boundary, so the reporter can match on the kind instead of
/// downcasting client-library error types.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The broker could not be reached while establishing a connection.
    #[error("broker unreachable: {0}")]
    BrokerUnreachable(String),

    /// The connection or channel was closed by the broker mid-operation,
    /// between connecting and finishing a declare or publish.
    #[error("operation interrupted: {0}")]
    Interrupted(String),

    /// The error envelope could not be serialized.
    #[error("failed to serialize error envelope: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else: programming errors, resource exhaustion, collaborator
    /// misbehavior. The terminal catch-all branch.
    #[error("unexpected failure in error reporting: {0}")]
    Unexpected(String),
}

// Allow converting from a string-like type into the catch-all variant
impl From<&str> for ReportError {
    fn from(s: &str) -> Self {
        ReportError::Unexpected(s.to_string())
    }
}

impl From<String> for ReportError {
    fn from(s: String) -> Self {
        ReportError::Unexpected(s)
    }
}
