//! End-to-end behaviour of the assistant pipeline with real provider clients
//! talking to local mock servers.

use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use pathfinder_assistant::{AssistantPipeline, NetworkMonitor, OfflinePatternResponder};
use pathfinder_config::SpacingScope;
use pathfinder_core::error::ProviderFailure;
use pathfinder_core::message::{ChatMessage, ConversationContext, EducationLevel};
use pathfinder_core::prompt::PromptContextBuilder;
use pathfinder_core::provider::{AssistantProvider, AssistantReply, ProviderDescriptor, ReplySource};
use pathfinder_providers::{OpenAiCompatProvider, RateLimiter};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn aisha() -> ConversationContext {
    ConversationContext::new("Aisha Khan", EducationLevel::PreCollege, "Srinagar")
}

fn descriptor(id: &str, priority: u32, endpoint: &str, confidence: f32) -> ProviderDescriptor {
    ProviderDescriptor {
        id: id.into(),
        priority,
        endpoint: endpoint.into(),
        auth_token: Some("test-key".into()),
        model: "mock-model".into(),
        request_timeout: Duration::from_secs(2),
        min_spacing: Duration::from_millis(1),
        confidence,
    }
}

fn limiter() -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new(Duration::from_millis(1), SpacingScope::Global))
}

fn openai(id: &str, priority: u32, endpoint: &str, limiter: Arc<RateLimiter>) -> Arc<dyn AssistantProvider> {
    Arc::new(OpenAiCompatProvider::new(
        descriptor(id, priority, endpoint, 0.95 - priority as f32 * 0.03),
        PromptContextBuilder::default(),
        limiter,
    ))
}

/// Spawn a chat completions mock on an ephemeral port; returns the base URL
/// and the number of requests it has served.
async fn mock_server(status: StatusCode, reply: &'static str) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/v1/chat/completions",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (
                    status,
                    axum::Json(json!({"choices": [{"message": {"content": reply}}]})),
                )
            }
        }),
    );
    (serve(router).await, hits)
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn assert_well_formed(reply: &AssistantReply) {
    assert!(!reply.message().trim().is_empty());
    assert!((0.0..=1.0).contains(&reply.confidence()));
    assert_eq!(
        reply.is_offline(),
        matches!(reply.source(), ReplySource::Offline | ReplySource::Fallback)
    );
}

#[tokio::test]
async fn every_message_gets_a_well_formed_reply() {
    let (down, _) = mock_server(StatusCode::INTERNAL_SERVER_ERROR, "").await;
    let (up, _) = mock_server(StatusCode::OK, "Here is some guidance.").await;

    let shared = limiter();
    let pipelines = [
        AssistantPipeline::new(Vec::new(), NetworkMonitor::default(), OfflinePatternResponder::default()),
        AssistantPipeline::new(
            vec![openai("provider_a", 0, &down, shared.clone())],
            NetworkMonitor::default(),
            OfflinePatternResponder::default(),
        ),
        AssistantPipeline::new(
            vec![openai("provider_a", 0, &up, shared.clone())],
            NetworkMonitor::new(false),
            OfflinePatternResponder::default(),
        ),
        AssistantPipeline::new(
            vec![openai("provider_a", 0, &up, shared)],
            NetworkMonitor::default(),
            OfflinePatternResponder::default(),
        ),
    ];
    let messages = ["", "hi", "I want to become a doctor", "xyzzy", "what after 12th?"];

    for pipeline in &pipelines {
        for message in messages {
            assert_well_formed(&pipeline.send_message(message, &aisha()).await);
        }
    }
}

#[tokio::test]
async fn second_provider_answers_when_first_fails() {
    let (failing, failing_hits) = mock_server(StatusCode::SERVICE_UNAVAILABLE, "").await;
    let (healthy, healthy_hits) = mock_server(StatusCode::OK, "Try NIT Srinagar.").await;
    let shared = limiter();

    let pipeline = AssistantPipeline::new(
        vec![
            openai("provider_a", 0, &failing, shared.clone()),
            openai("provider_b", 1, &healthy, shared),
        ],
        NetworkMonitor::default(),
        OfflinePatternResponder::default(),
    );

    let reply = pipeline.send_message("Tell me about engineering", &aisha()).await;
    assert_eq!(reply.source().as_str(), "provider_b");
    assert_eq!(reply.message(), "Try NIT Srinagar.");
    assert!(!reply.is_offline());
    assert!((reply.confidence() - 0.92).abs() < 1e-6);
    assert_eq!(failing_hits.load(Ordering::SeqCst), 1);
    assert_eq!(healthy_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn offline_device_never_touches_the_network() {
    let (server, hits) = mock_server(StatusCode::OK, "remote").await;
    let pipeline = AssistantPipeline::new(
        vec![openai("provider_a", 0, &server, limiter())],
        NetworkMonitor::new(false),
        OfflinePatternResponder::default(),
    );

    let reply = pipeline.send_message("hello", &aisha()).await;
    assert_eq!(reply.source(), &ReplySource::Offline);
    assert!(reply.is_offline());
    assert!(!pipeline.connection_status());
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    pipeline.monitor().set_online(true);
    let reply = pipeline.send_message("hello", &aisha()).await;
    assert_eq!(reply.source().as_str(), "provider_a");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn request_carries_only_recent_history() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let captured = seen.clone();
    let router = Router::new().route(
        "/v1/chat/completions",
        post(move |axum::Json(body): axum::Json<Value>| {
            let captured = captured.clone();
            async move {
                *captured.lock().unwrap() = Some(body);
                axum::Json(json!({"choices": [{"message": {"content": "ok"}}]}))
            }
        }),
    );
    let base = serve(router).await;
    let pipeline = AssistantPipeline::new(
        vec![openai("provider_a", 0, &base, limiter())],
        NetworkMonitor::default(),
        OfflinePatternResponder::default(),
    );

    let history = (0..10)
        .map(|i| {
            if i % 2 == 0 {
                ChatMessage::user(format!("question {i}"))
            } else {
                ChatMessage::assistant(format!("answer {i}"))
            }
        })
        .collect();
    pipeline
        .send_message("And after that?", &aisha().with_history(history))
        .await;

    let body = seen.lock().unwrap().clone().unwrap();
    let messages = body["messages"].as_array().unwrap();
    let history: Vec<&str> = messages[1..messages.len() - 1]
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(
        history,
        vec!["question 4", "answer 5", "question 6", "answer 7", "question 8", "answer 9"]
    );
    assert_eq!(messages.last().unwrap()["content"], "And after that?");
}

#[tokio::test]
async fn doctor_reply_offline_is_stable() {
    let pipeline = AssistantPipeline::new(
        Vec::new(),
        NetworkMonitor::new(false),
        OfflinePatternResponder::default(),
    );

    let first = pipeline.send_message("I want to become a doctor", &aisha()).await;
    for _ in 0..5 {
        let again = pipeline.send_message("I want to become a doctor", &aisha()).await;
        assert_eq!(again, first);
    }
    assert!((first.confidence() - 0.9).abs() < f32::EPSILON);
    assert!(first.message().contains("Aisha"));
    assert!(first.message().contains("GMC Srinagar"));
}

#[tokio::test]
async fn engineering_question_survives_total_outage() {
    let (a, a_hits) = mock_server(StatusCode::INTERNAL_SERVER_ERROR, "").await;
    let (b, b_hits) = mock_server(StatusCode::TOO_MANY_REQUESTS, "").await;
    let shared = limiter();
    let pipeline = AssistantPipeline::new(
        vec![
            openai("provider_a", 0, &a, shared.clone()),
            openai("provider_b", 1, &b, shared),
        ],
        NetworkMonitor::default(),
        OfflinePatternResponder::default(),
    );
    assert!(pipeline.connection_status());

    let reply = pipeline.send_message("Tell me about engineering", &aisha()).await;
    assert_eq!(reply.source().as_str(), "offline");
    assert!(reply.is_offline());
    assert!((reply.confidence() - 0.9).abs() < f32::EPSILON);
    assert!(reply.message().contains("Aisha"));
    assert!(reply.message().contains("NIT Srinagar") || reply.message().contains("JEE Main"));
    assert_eq!(a_hits.load(Ordering::SeqCst), 1);
    assert_eq!(b_hits.load(Ordering::SeqCst), 1);
}

/// Succeeds after waiting on the shared limiter, like the real clients do.
struct SpacedProvider {
    descriptor: ProviderDescriptor,
    limiter: Arc<RateLimiter>,
}

#[async_trait]
impl AssistantProvider for SpacedProvider {
    fn id(&self) -> &str {
        &self.descriptor.id
    }

    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn attempt(
        &self,
        _message: &str,
        _context: &ConversationContext,
    ) -> Result<AssistantReply, ProviderFailure> {
        self.limiter.wait(&self.descriptor.id).await;
        Ok(AssistantReply::from_provider(&self.descriptor.id, "spaced", 0.95))
    }
}

#[tokio::test(start_paused = true)]
async fn back_to_back_messages_are_spaced() {
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1000), SpacingScope::Global));
    let provider: Arc<dyn AssistantProvider> = Arc::new(SpacedProvider {
        descriptor: descriptor("provider_a", 0, "http://unused", 0.95),
        limiter,
    });
    let pipeline = AssistantPipeline::new(
        vec![provider],
        NetworkMonitor::default(),
        OfflinePatternResponder::default(),
    );

    let start = tokio::time::Instant::now();
    pipeline.send_message("one", &aisha()).await;
    assert!(start.elapsed() < Duration::from_millis(10));

    tokio::time::advance(Duration::from_millis(300)).await;
    pipeline.send_message("two", &aisha()).await;
    assert!(start.elapsed() >= Duration::from_millis(1000));
}

struct PanickingProvider {
    descriptor: ProviderDescriptor,
}

#[async_trait]
impl AssistantProvider for PanickingProvider {
    fn id(&self) -> &str {
        &self.descriptor.id
    }

    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn attempt(
        &self,
        _message: &str,
        _context: &ConversationContext,
    ) -> Result<AssistantReply, ProviderFailure> {
        let parts: Vec<&str> = Vec::new();
        Ok(AssistantReply::from_provider(&self.descriptor.id, parts[3], 0.95))
    }
}

#[tokio::test]
async fn panicking_provider_yields_fallback_reply() {
    let provider: Arc<dyn AssistantProvider> = Arc::new(PanickingProvider {
        descriptor: descriptor("provider_a", 0, "http://unused", 0.95),
    });
    let pipeline = AssistantPipeline::new(
        vec![provider],
        NetworkMonitor::default(),
        OfflinePatternResponder::default(),
    );

    let reply = pipeline.send_message("Tell me about engineering", &aisha()).await;
    assert_eq!(reply.source(), &ReplySource::Fallback);
    assert_eq!(reply.source().as_str(), "fallback");
    assert!(reply.is_offline());
    assert!((reply.confidence() - 0.5).abs() < f32::EPSILON);
    assert!(reply.message().contains("Aisha"));
}
