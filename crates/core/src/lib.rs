//! # Pathfinder Core
//!
//! Domain types, traits, and error definitions for the Pathfinder career
//! guidance assistant. This crate has no HTTP or runtime dependencies; it
//! defines the value objects and seams that the provider and assistant
//! crates implement against.
//!
//! ## Design Philosophy
//!
//! The remote backend is a trait (`AssistantProvider`) defined here, with
//! implementations in `pathfinder-providers`. The pipeline only ever sees
//! the trait, so tests substitute scripted providers freely.

pub mod assessment;
pub mod error;
pub mod message;
pub mod prompt;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use assessment::{AnswerChoice, Catalogue, CategoryScore};
pub use error::{Error, ProviderFailure, Result};
pub use message::{ChatMessage, ConversationContext, EducationLevel, Role};
pub use prompt::{PromptContextBuilder, PromptParts};
pub use provider::{AssistantProvider, AssistantReply, ProviderDescriptor, ReplySource};
