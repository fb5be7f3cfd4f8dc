//! Chat message and conversation context value objects.
//!
//! The host application owns these. The assistant pipeline only borrows a
//! `ConversationContext` for the duration of one call and never mutates it.

use serde::{Deserialize, Serialize};

/// Name used when the student has not told us theirs.
pub const PLACEHOLDER_NAME: &str = "Student";

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The student
    User,
    /// The assistant
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Where the student currently is in their schooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EducationLevel {
    /// Before class 10 boards; choosing a stream is the big decision.
    #[serde(rename = "pre-high-school")]
    PreHighSchool,
    /// Class 11/12; choosing a degree or entrance exam is the big decision.
    #[serde(rename = "pre-college")]
    PreCollege,
}

impl EducationLevel {
    /// Human-readable label used inside prompts and offline replies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PreHighSchool => "class 10 (before high school)",
            Self::PreCollege => "class 12 (before college)",
        }
    }

    /// The wire identifier (`pre-high-school` / `pre-college`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreHighSchool => "pre-high-school",
            Self::PreCollege => "pre-college",
        }
    }
}

impl std::str::FromStr for EducationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pre-high-school" | "prehighschool" | "10th" | "class10" => Ok(Self::PreHighSchool),
            "pre-college" | "precollege" | "12th" | "class12" => Ok(Self::PreCollege),
            other => Err(format!(
                "unknown education level '{other}' (expected 'pre-high-school' or 'pre-college')"
            )),
        }
    }
}

impl std::fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the assistant knows about the student for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(default)]
    pub display_name: String,

    pub education_level: EducationLevel,

    #[serde(default)]
    pub region: String,

    /// Interests in the order the student picked them
    #[serde(default)]
    pub interests: Vec<String>,

    /// Conversation so far, oldest first
    #[serde(default)]
    pub prior_messages: Vec<ChatMessage>,
}

impl ConversationContext {
    /// Create a context with no interests and no history.
    pub fn new(
        display_name: impl Into<String>,
        education_level: EducationLevel,
        region: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            education_level,
            region: region.into(),
            interests: Vec::new(),
            prior_messages: Vec::new(),
        }
    }

    pub fn with_interests(mut self, interests: Vec<String>) -> Self {
        self.interests = interests;
        self
    }

    pub fn with_history(mut self, prior_messages: Vec<ChatMessage>) -> Self {
        self.prior_messages = prior_messages;
        self
    }

    /// First whitespace-separated token of the display name, or the
    /// placeholder when the name is blank.
    pub fn first_name(&self) -> &str {
        self.display_name
            .split_whitespace()
            .next()
            .unwrap_or(PLACEHOLDER_NAME)
    }

    /// Region, or a neutral phrase when the caller left it empty.
    pub fn region_or_default(&self) -> &str {
        let region = self.region.trim();
        if region.is_empty() { "your area" } else { region }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_name_takes_first_token() {
        let ctx = ConversationContext::new("  Aisha   Khan ", EducationLevel::PreCollege, "Srinagar");
        assert_eq!(ctx.first_name(), "Aisha");
    }

    #[test]
    fn blank_name_uses_placeholder() {
        let ctx = ConversationContext::new("   ", EducationLevel::PreHighSchool, "Jammu");
        assert_eq!(ctx.first_name(), PLACEHOLDER_NAME);
    }

    #[test]
    fn education_level_wire_names() {
        let json = serde_json::to_string(&EducationLevel::PreHighSchool).unwrap();
        assert_eq!(json, "\"pre-high-school\"");
        let parsed: EducationLevel = serde_json::from_str("\"pre-college\"").unwrap();
        assert_eq!(parsed, EducationLevel::PreCollege);
    }

    #[test]
    fn education_level_from_str() {
        assert_eq!("12th".parse::<EducationLevel>().unwrap(), EducationLevel::PreCollege);
        assert_eq!(
            "Pre-High-School".parse::<EducationLevel>().unwrap(),
            EducationLevel::PreHighSchool
        );
        assert!("phd".parse::<EducationLevel>().is_err());
    }

    #[test]
    fn context_deserializes_with_missing_optionals() {
        let ctx: ConversationContext =
            serde_json::from_str(r#"{"education_level":"pre-college"}"#).unwrap();
        assert_eq!(ctx.first_name(), PLACEHOLDER_NAME);
        assert_eq!(ctx.region_or_default(), "your area");
        assert!(ctx.prior_messages.is_empty());
    }

    #[test]
    fn roles_serialize_lowercase() {
        let msg = ChatMessage::assistant("hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"assistant\""));
    }
}
