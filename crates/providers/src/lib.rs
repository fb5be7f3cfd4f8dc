//! Remote inference providers for Pathfinder.
//!
//! All providers implement the `pathfinder_core::AssistantProvider` trait and
//! share one `RateLimiter`. `build_from_config` assembles them into the
//! priority-ordered chain the assistant pipeline walks.

pub mod chain;
pub mod gemini;
pub mod limiter;
pub mod openai_compat;
pub mod transport;

pub use chain::build_from_config;
pub use gemini::GeminiProvider;
pub use limiter::RateLimiter;
pub use openai_compat::OpenAiCompatProvider;
