//! Google Gemini provider implementation.
//!
//! Uses the native `generateContent` API rather than an OpenAI-compatible
//! proxy:
//! - API key sent in the `x-goog-api-key` header, never in the URL
//! - System prompt as a top-level `systemInstruction`
//! - Assistant turns use the `model` role
//! - Reply text spread across `candidates[0].content.parts`

use async_trait::async_trait;
use pathfinder_core::error::ProviderFailure;
use pathfinder_core::message::{ConversationContext, Role};
use pathfinder_core::prompt::{PromptContextBuilder, PromptParts};
use pathfinder_core::provider::{AssistantProvider, AssistantReply, ProviderDescriptor};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::limiter::RateLimiter;
use crate::transport::{best_effort_text, default_client, send_json};

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    descriptor: ProviderDescriptor,
    prompt: PromptContextBuilder,
    limiter: Arc<RateLimiter>,
    client: reqwest::Client,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiProvider {
    pub fn new(
        descriptor: ProviderDescriptor,
        prompt: PromptContextBuilder,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let mut descriptor = descriptor;
        descriptor.endpoint = descriptor.endpoint.trim_end_matches('/').to_string();
        Self {
            descriptor,
            prompt,
            limiter,
            client: default_client(),
            temperature: 0.7,
            max_output_tokens: 512,
        }
    }

    /// Share an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_output_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.descriptor.endpoint, self.descriptor.model
        )
    }

    /// Request body for one `generateContent` call.
    ///
    /// Gemini has no system role inside `contents`, so system entries from
    /// the history are appended to the system instruction instead.
    pub(crate) fn request_body(&self, parts: &PromptParts<'_>) -> serde_json::Value {
        let mut system = parts.system.clone();
        let mut contents = Vec::with_capacity(parts.history.len() + 1);

        for message in parts.history {
            let role = match message.role {
                Role::System => {
                    system.push_str("\n\n");
                    system.push_str(&message.content);
                    continue;
                }
                Role::User => "user",
                Role::Assistant => "model",
            };
            contents.push(Content::text(role, &message.content));
        }
        contents.push(Content::text("user", parts.user));

        serde_json::json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": contents,
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
            },
        })
    }

    /// Pull the reply text out of a `generateContent` response.
    pub(crate) fn parse_reply(body: &serde_json::Value) -> Result<String, ProviderFailure> {
        let Some(candidate) = body
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
        else {
            let reason = body
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
                .map(|r| format!("prompt blocked: {r}"))
                .unwrap_or_else(|| "No candidates in response".into());
            return Err(ProviderFailure::MalformedResponse(reason));
        };

        candidate
            .pointer("/content/parts")
            .and_then(best_effort_text)
            .ok_or_else(|| {
                let finish = candidate
                    .get("finishReason")
                    .and_then(|f| f.as_str())
                    .unwrap_or("unknown");
                ProviderFailure::MalformedResponse(format!(
                    "candidate has no text (finishReason: {finish})"
                ))
            })
    }
}

#[async_trait]
impl AssistantProvider for GeminiProvider {
    fn id(&self) -> &str {
        &self.descriptor.id
    }

    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn attempt(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> Result<AssistantReply, ProviderFailure> {
        let Some(api_key) = self.descriptor.auth_token.as_deref() else {
            return Err(ProviderFailure::NotConfigured(format!(
                "no API key for provider '{}'",
                self.descriptor.id
            )));
        };

        let parts = self.prompt.build(context, message);
        let body = self.request_body(&parts);

        self.limiter.wait(&self.descriptor.id).await;

        debug!(
            provider = %self.descriptor.id,
            model = %self.descriptor.model,
            history = parts.history.len(),
            "Sending generateContent request"
        );

        let request = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body);
        let response = send_json(&self.descriptor.id, request, self.descriptor.request_timeout).await?;
        let text = Self::parse_reply(&response)?;

        Ok(AssistantReply::from_provider(
            &self.descriptor.id,
            text,
            self.descriptor.confidence,
        ))
    }
}

// --- API types ---

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> Content<'a> {
    fn text(role: &'static str, text: &'a str) -> Self {
        Self {
            role,
            parts: [Part { text }],
        }
    }
}
