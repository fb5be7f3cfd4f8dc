//! # Pathfinder Assistant
//!
//! The response pipeline: a connectivity monitor, the priority-ordered
//! provider chain with fallback, and an offline rule-based responder that
//! guarantees every message gets an answer.
//!
//! ```no_run
//! # async fn demo() {
//! use pathfinder_assistant::AssistantPipeline;
//! use pathfinder_core::{ConversationContext, EducationLevel};
//!
//! let config = pathfinder_config::AppConfig::default();
//! let pipeline = AssistantPipeline::from_config(&config);
//! let ctx = ConversationContext::new("Aisha Khan", EducationLevel::PreCollege, "Srinagar");
//! let reply = pipeline.send_message("Tell me about engineering", &ctx).await;
//! println!("[{}] {}", reply.source(), reply.message());
//! # }
//! ```

pub mod network;
pub mod offline;
pub mod pipeline;

pub use network::NetworkMonitor;
pub use offline::{OfflinePatternResponder, OfflineRule};
pub use pipeline::AssistantPipeline;
