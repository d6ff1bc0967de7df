//! Stage failure taxonomy
//!
//! Two families of errors cross the invoker boundary:
//! - [`StageError`]: a semantic-stage call failed. Transient kinds are
//!   retried with backoff, then routed to the stage's deterministic fallback;
//!   they never surface to the caller.
//! - [`FallbackError`]: the fallback itself failed. Fatal; a bug in fallback
//!   logic is not recoverable by further fallback.

/// Result of one semantic-stage call
pub type StageResult<T> = Result<T, StageError>;

/// Failure of a semantic-stage call
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The remote backend call failed (network, rate limit, 5xx)
    #[error("remote call failed: {0}")]
    RemoteCall(String),

    /// The backend produced unstructured or undecodable output
    #[error("malformed stage output: {0}")]
    MalformedOutput(String),

    /// The output decoded but violated its expected shape
    #[error("output schema validation failed: {0}")]
    SchemaValidation(String),

    /// The stage call timed out
    #[error("stage call timed out after {duration_secs}s")]
    Timeout {
        /// Seconds waited before giving up
        duration_secs: u64,
    },

    /// Anything else; not retried
    #[error("stage failed: {0}")]
    Other(String),
}

impl StageError {
    /// Whether the invoker should retry this failure
    ///
    /// Remote-call failures, malformed output, schema mismatches, and
    /// timeouts are transient. Everything else goes straight to fallback.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Short kind label for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RemoteCall(_) => "remote_call",
            Self::MalformedOutput(_) => "malformed_output",
            Self::SchemaValidation(_) => "schema_validation",
            Self::Timeout { .. } => "timeout",
            Self::Other(_) => "other",
        }
    }
}

/// Fatal failure inside a stage fallback
///
/// The invoker never catches these; they propagate out of the pipeline or
/// refinement call that triggered the fallback.
#[derive(Debug, thiserror::Error)]
#[error("fallback for stage `{stage}` failed: {source}")]
pub struct FallbackError {
    /// Stage whose fallback failed
    pub stage: String,
    /// Underlying cause
    #[source]
    pub source: anyhow::Error,
}

impl FallbackError {
    /// Wrap a fallback failure with its stage name
    #[must_use]
    pub fn new(stage: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            stage: stage.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification_covers_retryable_kinds() {
        assert!(StageError::RemoteCall("503".into()).is_transient());
        assert!(StageError::MalformedOutput("not json".into()).is_transient());
        assert!(StageError::SchemaValidation("missing field".into()).is_transient());
        assert!(StageError::Timeout { duration_secs: 30 }.is_transient());
        assert!(!StageError::Other("backend misconfigured".into()).is_transient());
    }

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(StageError::RemoteCall("x".into()).kind(), "remote_call");
        assert_eq!(StageError::Timeout { duration_secs: 1 }.kind(), "timeout");
        assert_eq!(StageError::Other("x".into()).kind(), "other");
    }
}
