//! Prompt context assembly for remote providers.
//!
//! Builds the system instructions from the student's context and trims the
//! conversation history to a bounded window before it is sent anywhere.
//!
//! # Determinism
//!
//! Identical contexts always produce identical prompts. No randomness, clock
//! or I/O is involved.

use crate::message::{ChatMessage, ConversationContext, EducationLevel};

/// Default number of prior messages forwarded to a provider.
pub const DEFAULT_HISTORY_WINDOW: usize = 6;

/// Everything a provider needs to format its request body.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptParts<'a> {
    /// Rendered system instructions.
    pub system: String,
    /// The most recent prior messages, oldest first.
    pub history: &'a [ChatMessage],
    /// The message being answered.
    pub user: &'a str,
}

/// Stateless prompt builder. Create one and reuse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptContextBuilder {
    history_window: usize,
}

impl Default for PromptContextBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl PromptContextBuilder {
    pub fn new(history_window: usize) -> Self {
        Self { history_window }
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Render the system instructions for this student.
    pub fn system_prompt(&self, context: &ConversationContext) -> String {
        let mut prompt = format!(
            "You are a friendly, practical career guidance counsellor for students in India. \
             You are talking to {name}, a student in {level} from {region}.\n\n",
            name = context.first_name(),
            level = context.education_level.label(),
            region = context.region_or_default(),
        );

        prompt.push_str(match context.education_level {
            EducationLevel::PreHighSchool => {
                "Focus on choosing a stream after class 10 (Science with PCM or PCB, Commerce, \
                 Arts/Humanities, or vocational courses), how subjects connect to careers, and \
                 study habits for board exams.\n"
            }
            EducationLevel::PreCollege => {
                "Focus on degree choices after class 12, entrance exams (JEE, NEET, CUET and \
                 state-level tests), colleges, scholarships and realistic career paths.\n"
            }
        });

        if !context.interests.is_empty() {
            prompt.push_str(&format!(
                "The student is interested in: {}.\n",
                context.interests.join(", ")
            ));
        }

        prompt.push_str(
            "\nGuidelines:\n\
             - Address the student by first name and keep replies under 200 words.\n\
             - Prefer options, institutions and exams that are reachable from the student's region.\n\
             - Be encouraging and concrete; suggest one or two next steps.\n\
             - If you are unsure about dates, fees or cut-offs, say so and suggest where to check.",
        );

        prompt
    }

    /// The last `history_window` prior messages, oldest first.
    pub fn window<'a>(&self, messages: &'a [ChatMessage]) -> &'a [ChatMessage] {
        let start = messages.len().saturating_sub(self.history_window);
        &messages[start..]
    }

    /// Assemble the system prompt, history window and user message together.
    pub fn build<'a>(&self, context: &'a ConversationContext, user: &'a str) -> PromptParts<'a> {
        PromptParts {
            system: self.system_prompt(context),
            history: self.window(&context.prior_messages),
            user,
        }
    }
}
