//! OpenAI-compatible provider implementation.
//!
//! Works with: Groq, OpenAI, OpenRouter, Together AI, Ollama, vLLM and any
//! endpoint exposing `/chat/completions`. Groq is the default "fast and
//! cheap" first choice in the provider chain.

use async_trait::async_trait;
use pathfinder_core::error::ProviderFailure;
use pathfinder_core::message::{ChatMessage, ConversationContext, Role};
use pathfinder_core::prompt::{PromptContextBuilder, PromptParts};
use pathfinder_core::provider::{AssistantProvider, AssistantReply, ProviderDescriptor};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::limiter::RateLimiter;
use crate::transport::{best_effort_text, default_client, send_json};

/// A provider speaking the OpenAI chat completions protocol.
pub struct OpenAiCompatProvider {
    descriptor: ProviderDescriptor,
    prompt: PromptContextBuilder,
    limiter: Arc<RateLimiter>,
    client: reqwest::Client,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
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
            max_tokens: 512,
        }
    }

    /// Share an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Convert prompt parts to the chat completions message list.
    fn to_api_messages(parts: &PromptParts<'_>) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(parts.history.len() + 2);
        messages.push(ApiMessage {
            role: "system",
            content: parts.system.clone(),
        });
        messages.extend(parts.history.iter().map(|m: &ChatMessage| ApiMessage {
            role: match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: m.content.clone(),
        }));
        messages.push(ApiMessage {
            role: "user",
            content: parts.user.to_string(),
        });
        messages
    }

    /// Request body for one completion.
    pub(crate) fn request_body(&self, parts: &PromptParts<'_>) -> serde_json::Value {
        serde_json::json!({
            "model": self.descriptor.model,
            "messages": Self::to_api_messages(parts),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
        })
    }

    /// Pull the reply text out of a completion response.
    pub(crate) fn parse_reply(body: &serde_json::Value) -> Result<String, ProviderFailure> {
        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unspecified error");
            return Err(ProviderFailure::MalformedResponse(format!(
                "error object in response: {message}"
            )));
        }

        let choice = body
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| ProviderFailure::MalformedResponse("No choices in response".into()))?;

        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .or_else(|| choice.get("text"))
            .and_then(best_effort_text)
            .ok_or_else(|| ProviderFailure::MalformedResponse("Empty message content".into()))
    }
}

#[async_trait]
impl AssistantProvider for OpenAiCompatProvider {
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
        let url = format!("{}/chat/completions", self.descriptor.endpoint);

        self.limiter.wait(&self.descriptor.id).await;

        debug!(
            provider = %self.descriptor.id,
            model = %self.descriptor.model,
            history = parts.history.len(),
            "Sending completion request"
        );

        let request = self
            .client
            .post(&url)
            .bearer_auth(api_key)
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
struct ApiMessage {
    role: &'static str,
    content: String,
}
