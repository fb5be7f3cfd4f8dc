//! Provider trait: the abstraction over remote inference backends.
//!
//! A provider knows how to turn a student's message plus their conversation
//! context into one remote call and parse the reply, or fail with a
//! `ProviderFailure`. It never retries; trying the next backend is the
//! pipeline's job.
//!
//! Implementations: OpenAI-compatible chat completions, Gemini.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::error::ProviderFailure;
use crate::message::ConversationContext;

/// Where a reply came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum ReplySource {
    /// A remote provider, identified by its configured id
    Provider(String),
    /// The offline pattern responder (network down or every provider failed)
    Offline,
    /// The offline responder after the online path broke unexpectedly
    Fallback,
}

impl ReplySource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Provider(id) => id,
            Self::Offline => "offline",
            Self::Fallback => "fallback",
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline | Self::Fallback)
    }
}

impl From<ReplySource> for String {
    fn from(source: ReplySource) -> Self {
        match source {
            ReplySource::Provider(id) => id,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ReplySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single value produced per `send_message` call.
///
/// Fields are private so the `is_offline` / `source` pairing and the
/// confidence range always hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantReply {
    message: String,
    is_offline: bool,
    source: ReplySource,
    confidence: f32,
}

impl AssistantReply {
    /// A reply produced by a remote provider.
    pub fn from_provider(id: impl Into<String>, message: impl Into<String>, confidence: f32) -> Self {
        Self::new(ReplySource::Provider(id.into()), message, confidence)
    }

    /// A reply produced by the offline responder.
    pub fn offline(message: impl Into<String>, confidence: f32) -> Self {
        Self::new(ReplySource::Offline, message, confidence)
    }

    fn new(source: ReplySource, message: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            message: message.into(),
            is_offline: source.is_offline(),
            source,
            confidence,
        }
    }

    /// Re-tag an offline reply as produced by the safety net.
    pub fn into_fallback(self, confidence: f32) -> Self {
        Self::new(ReplySource::Fallback, self.message, confidence)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_offline(&self) -> bool {
        self.is_offline
    }

    pub fn source(&self) -> &ReplySource {
        &self.source
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// Static description of one remote backend, built once from config.
#[derive(Clone)]
pub struct ProviderDescriptor {
    /// Identity reported in `ReplySource::Provider`
    pub id: String,

    /// Lower is tried first
    pub priority: u32,

    /// Base URL of the API
    pub endpoint: String,

    /// API key; `None` means the provider is skipped as not configured
    pub auth_token: Option<String>,

    /// Model name sent in the request
    pub model: String,

    /// Bound on a single network call
    pub request_timeout: Duration,

    /// Minimum spacing between outbound calls
    pub min_spacing: Duration,

    /// Confidence this provider declares for its replies
    pub confidence: f32,
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("endpoint", &self.endpoint)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .field("min_spacing", &self.min_spacing)
            .field("confidence", &self.confidence)
            .finish()
    }
}

/// The core provider trait.
///
/// The pipeline calls `attempt()` on each provider in priority order without
/// knowing which backend sits behind it.
#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// The configured identity of this provider (e.g. "provider_a").
    fn id(&self) -> &str;

    /// Static configuration for this provider.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Produce a reply for `message`, or report why it could not.
    async fn attempt(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> std::result::Result<AssistantReply, ProviderFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_reply_is_online() {
        let reply = AssistantReply::from_provider("provider_a", "Hello", 0.95);
        assert!(!reply.is_offline());
        assert_eq!(reply.source(), &ReplySource::Provider("provider_a".into()));
    }

    #[test]
    fn offline_and_fallback_are_offline() {
        let reply = AssistantReply::offline("Hi", 0.6);
        assert!(reply.is_offline());
        let fallback = reply.into_fallback(0.5);
        assert!(fallback.is_offline());
        assert_eq!(fallback.source(), &ReplySource::Fallback);
        assert!((fallback.confidence() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(AssistantReply::offline("x", 1.7).confidence(), 1.0);
        assert_eq!(AssistantReply::offline("x", -0.2).confidence(), 0.0);
        assert_eq!(AssistantReply::offline("x", f32::NAN).confidence(), 0.0);
    }

    #[test]
    fn reply_serializes_source_as_string() {
        let reply = AssistantReply::offline("Hi", 0.6);
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["source"], "offline");
        assert_eq!(json["is_offline"], true);

        let remote = AssistantReply::from_provider("groq", "Hey", 0.9);
        let json = serde_json::to_value(&remote).unwrap();
        assert_eq!(json["source"], "groq");
    }

    #[test]
    fn descriptor_debug_redacts_token() {
        let descriptor = ProviderDescriptor {
            id: "provider_a".into(),
            priority: 0,
            endpoint: "https://api.groq.com/openai/v1".into(),
            auth_token: Some("gsk-secret".into()),
            model: "llama".into(),
            request_timeout: Duration::from_secs(15),
            min_spacing: Duration::from_millis(1000),
            confidence: 0.95,
        };
        let debug = format!("{descriptor:?}");
        assert!(!debug.contains("gsk-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
