//! Error types for the Pathfinder domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Provider failures are recovered inside the pipeline and never reach the
//! caller of `send_message`; the top-level `Error` only surfaces on the
//! startup and tooling paths (assessment files, CLI input).

use thiserror::Error;

/// The top-level error type for Pathfinder operations outside the reply path.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider failure: {0}")]
    Provider(#[from] ProviderFailure),

    // --- Assessment errors ---
    #[error("Assessment error: {0}")]
    Assessment(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A single remote provider attempt failed.
///
/// Every variant is treated the same by the pipeline: log, then move on to
/// the next provider in priority order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderFailure {
    #[error("HTTP {status} from provider: {body}")]
    Http { status: u16, body: String },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderFailure {
    /// Short machine-friendly label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Timeout { .. } => "timeout",
            Self::Transport(_) => "transport",
            Self::MalformedResponse(_) => "malformed",
            Self::NotConfigured(_) => "not_configured",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failure_displays_status() {
        let err = Error::Provider(ProviderFailure::Http {
            status: 429,
            body: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn failure_kinds_are_distinct() {
        let kinds = [
            ProviderFailure::Http { status: 500, body: String::new() }.kind(),
            ProviderFailure::Timeout { timeout_ms: 10 }.kind(),
            ProviderFailure::Transport("refused".into()).kind(),
            ProviderFailure::MalformedResponse("no choices".into()).kind(),
            ProviderFailure::NotConfigured("no key".into()).kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn timeout_mentions_duration() {
        let err = ProviderFailure::Timeout { timeout_ms: 1500 };
        assert!(err.to_string().contains("1500ms"));
    }
}
