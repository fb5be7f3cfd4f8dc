//! Offline pattern responder, the pipeline's safety net.
//!
//! A deterministic, rule-based responder used when the device is offline or
//! when every remote provider failed. Rules are data: an ordered list of
//! keyword predicates with a reply template and a fixed confidence. The first
//! matching rule wins. When nothing matches, one of a few generic
//! encouragement replies is picked at random with a lower confidence.
//!
//! The responder is total: every input produces a reply.

use pathfinder_config::OfflineConfig;
use pathfinder_core::message::{ConversationContext, EducationLevel};
use pathfinder_core::provider::AssistantReply;
use rand::Rng;
use tracing::debug;

/// One entry in the ordered rule table.
#[derive(Debug, Clone)]
pub struct OfflineRule {
    /// Stable name, used for confidence overrides and logs
    pub name: &'static str,
    /// Single words match a message word exactly, or as a prefix when the
    /// keyword has four or more letters; anything else is a phrase matched
    /// as a substring
    pub keywords: &'static [&'static str],
    /// Only applies to students at this level
    pub level: Option<EducationLevel>,
    /// Only applies when the context lists interests
    pub requires_interests: bool,
    pub template: &'static str,
    pub confidence: f32,
}

impl OfflineRule {
    fn matches(&self, message: &MessageText<'_>, context: &ConversationContext) -> bool {
        if let Some(level) = self.level {
            if context.education_level != level {
                return false;
            }
        }
        if self.requires_interests && context.interests.is_empty() {
            return false;
        }
        self.keywords.iter().any(|keyword| message.contains_keyword(keyword))
    }
}

/// A lower-cased message split into words once per call.
struct MessageText<'a> {
    lowered: &'a str,
    words: Vec<&'a str>,
}

impl<'a> MessageText<'a> {
    fn new(lowered: &'a str) -> Self {
        Self {
            lowered,
            words: lowered
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    fn contains_keyword(&self, keyword: &str) -> bool {
        if !keyword.chars().all(char::is_alphanumeric) {
            return self.lowered.contains(keyword);
        }
        self.words.iter().any(|word| {
            *word == keyword || (keyword.chars().count() >= 4 && word.starts_with(keyword))
        })
    }
}

/// Built-in rules, in evaluation order.
pub const BUILTIN_RULES: &[OfflineRule] = &[
    OfflineRule {
        name: "medical",
        keywords: &[
            "doctor", "medical", "medicine", "mbbs", "neet", "nurse", "nursing", "pharma",
            "bds", "dentist", "surgeon", "hospital",
        ],
        level: None,
        requires_interests: false,
        template: "{name}, a career in medicine is a wonderful goal! With Physics, Chemistry and \
                   Biology in class 11 and 12, the main gateway is {medical_exams}. Near {region}, \
                   colleges like {medical_colleges} offer MBBS and related courses. Beyond MBBS, \
                   look at BDS, nursing, pharmacy and allied health sciences. Start with NCERT \
                   Biology and Chemistry and practise previous-year papers regularly.",
        confidence: 0.9,
    },
    OfflineRule {
        name: "engineering",
        keywords: &[
            "engineer", "engineering", "technical", "technology", "jee", "b.tech", "btech",
            "coding", "computer", "software", "robotics",
        ],
        level: None,
        requires_interests: false,
        template: "{name}, engineering opens many doors! With Physics, Chemistry and Mathematics \
                   in class 11 and 12, you can prepare for {engineering_exams}. Around {region}, \
                   institutes such as {engineering_colleges} are strong options. Popular branches \
                   include computer science, civil, electrical and mechanical engineering. Build \
                   your maths foundation early and try small projects to find the branch you enjoy.",
        confidence: 0.9,
    },
    OfflineRule {
        name: "teaching",
        keywords: &["teach", "educator", "education", "professor", "lecturer", "b.ed"],
        level: None,
        requires_interests: false,
        template: "{name}, teaching is one of the most respected careers! Complete a bachelor's \
                   degree in the subject you love at a university such as {universities}, then a \
                   B.Ed to teach in schools. For college teaching, a master's degree and UGC-NET \
                   open the way. Government school posts in {region} are filled through \
                   recruitment exams like {government_exams}, so keep an eye on notifications.",
        confidence: 0.85,
    },
    OfflineRule {
        name: "stream_selection",
        keywords: &[
            "stream", "subject", "11th", "class 11", "pcm", "pcb", "choose", "which course",
            "science or", "commerce or", "arts or",
        ],
        level: Some(EducationLevel::PreHighSchool),
        requires_interests: false,
        template: "{name}, choosing a stream after class 10 is a big step, so take it one question \
                   at a time. Science with PCM leads towards engineering ({engineering_exams}), \
                   Science with PCB towards medicine ({medical_exams}), Commerce towards CA, \
                   banking and business, and Arts/Humanities towards law, civil services, \
                   journalism and teaching. Pick the subjects you enjoy and score well in, and \
                   talk to a teacher at your school in {region} about your options.",
        confidence: 0.85,
    },
    OfflineRule {
        name: "after_twelfth",
        keywords: &[
            "after 12th", "after class 12", "college", "degree", "course", "university",
            "admission", "cuet", "graduation", "stream",
        ],
        level: Some(EducationLevel::PreCollege),
        requires_interests: false,
        template: "{name}, after class 12 you have many good paths. Entrance exams like \
                   {engineering_exams} and {medical_exams} lead to professional courses, while \
                   CUET opens undergraduate programmes at central universities. Near {region}, \
                   {universities} offer a wide range of degrees. Shortlist two or three courses \
                   that match your strengths, then check eligibility and application dates early.",
        confidence: 0.85,
    },
    OfflineRule {
        name: "government",
        keywords: &[
            "government", "sarkari", "civil service", "ias", "ips", "upsc", "jkssb", "jkpsc",
            "police", "army", "defence", "nda",
        ],
        level: None,
        requires_interests: false,
        template: "{name}, government jobs offer stability and a chance to serve {region}. Exams \
                   such as {government_exams} recruit for many posts, and a graduation degree is \
                   the basic requirement for most of them. For defence careers, NDA is open after \
                   class 12. Build strong general knowledge, read a newspaper daily and practise \
                   aptitude questions.",
        confidence: 0.85,
    },
    OfflineRule {
        name: "commerce",
        keywords: &[
            "commerce", "business", "accountant", "accounting", "chartered", "finance", "bank",
            "entrepreneur", "startup", "mba", "economics",
        ],
        level: None,
        requires_interests: false,
        template: "{name}, commerce and business offer exciting careers! You can pursue B.Com, \
                   BBA or economics at {universities}, or professional courses like CA, CS and \
                   CMA. Banking exams are another steady option. If you dream of your own \
                   venture, start small in {region}: learn accounts, understand customers and \
                   build a plan.",
        confidence: 0.8,
    },
    OfflineRule {
        name: "arts",
        keywords: &[
            "art", "arts", "design", "music", "writer", "writing", "journalism", "media",
            "photography", "film", "law", "lawyer", "psychology", "humanities",
        ],
        level: None,
        requires_interests: false,
        template: "{name}, creative and humanities careers are full of possibilities! Arts and \
                   humanities at {universities} lead to law, journalism, psychology, design, fine \
                   arts and civil services. Build a portfolio of your work, whether writing, \
                   drawing, photography or music, and look for workshops or internships in \
                   {region} to gain real experience.",
        confidence: 0.8,
    },
    OfflineRule {
        name: "interests",
        keywords: &[
            "interest", "suggest", "recommend", "career", "job", "future", "what should i",
            "confused",
        ],
        level: None,
        requires_interests: true,
        template: "{name}, based on your interest in {interests}, start by exploring careers that \
                   use those strengths every day. Look up people from {region} working in those \
                   fields, ask about their journey, and try a small project or course this month. \
                   Tell me more about what you enjoy most and I can suggest specific paths.",
        confidence: 0.8,
    },
    OfflineRule {
        name: "greeting",
        keywords: &[
            "hello", "hi", "hey", "salaam", "assalamualaikum", "namaste", "good morning",
            "good evening",
        ],
        level: None,
        requires_interests: false,
        template: "Hello {name}! I'm your career guide. I can help you with streams after class \
                   10, courses after class 12, entrance exams and colleges around {region}. What \
                   would you like to explore today?",
        confidence: 0.8,
    },
];

/// Replies used when no rule matches.
pub const GENERIC_TEMPLATES: &[&str] = &[
    "{name}, that's a great question! Every career path starts with understanding what you \
     enjoy and what you are good at. Tell me which subjects you like most and I'll suggest \
     options around {region}.",
    "Keep going, {name}! Exploring your options early is the best thing you can do. Ask me about \
     streams, entrance exams, colleges or careers like medicine, engineering or teaching.",
    "{name}, I'm here to help you plan your future. I'm working offline right now, so my answers \
     are shorter than usual, but you can ask about careers, exams and colleges near {region}.",
    "Every successful professional started where you are now, {name}. Share your interests or a \
     career you're curious about, and we'll work out the next steps together.",
];

/// Rule-based responder. Never fails.
#[derive(Debug, Clone)]
pub struct OfflinePatternResponder {
    rules: Vec<OfflineRule>,
    institutions: OfflineConfig,
    generic_confidence: f32,
    fallback_confidence: f32,
}

impl Default for OfflinePatternResponder {
    fn default() -> Self {
        Self::from_config(&OfflineConfig::default())
    }
}

impl OfflinePatternResponder {
    /// Built-in rules with confidences and institutions from config.
    pub fn from_config(config: &OfflineConfig) -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .cloned()
            .map(|mut rule| {
                if let Some(confidence) = config.rule_confidence_for(rule.name) {
                    rule.confidence = confidence;
                }
                rule
            })
            .collect();
        Self::with_rules(rules, config)
    }

    /// A custom rule table, evaluated in the given order.
    pub fn with_rules(rules: Vec<OfflineRule>, config: &OfflineConfig) -> Self {
        Self {
            rules,
            institutions: config.clone(),
            generic_confidence: config.generic_confidence,
            fallback_confidence: config.fallback_confidence,
        }
    }

    pub fn rules(&self) -> &[OfflineRule] {
        &self.rules
    }

    pub fn generic_confidence(&self) -> f32 {
        self.generic_confidence
    }

    /// Confidence used when the online path broke unexpectedly.
    pub fn fallback_confidence(&self) -> f32 {
        self.fallback_confidence
    }

    /// The first rule matching this message, if any.
    pub fn matched_rule(&self, message: &str, context: &ConversationContext) -> Option<&OfflineRule> {
        let lowered = message.to_lowercase();
        let text = MessageText::new(&lowered);
        self.rules.iter().find(|rule| rule.matches(&text, context))
    }

    /// Answer from the rule table, using the thread-local RNG for the
    /// generic branch.
    pub fn respond(&self, message: &str, context: &ConversationContext) -> AssistantReply {
        self.respond_with_rng(message, context, &mut rand::rng())
    }

    /// Answer from the rule table with a caller-supplied RNG.
    pub fn respond_with_rng<R: Rng + ?Sized>(
        &self,
        message: &str,
        context: &ConversationContext,
        rng: &mut R,
    ) -> AssistantReply {
        if let Some(rule) = self.matched_rule(message, context) {
            debug!(rule = rule.name, "Offline rule matched");
            return AssistantReply::offline(self.render(rule.template, context), rule.confidence);
        }

        let template = GENERIC_TEMPLATES[rng.random_range(0..GENERIC_TEMPLATES.len())];
        debug!("No offline rule matched; using generic reply");
        AssistantReply::offline(self.render(template, context), self.generic_confidence)
    }

    /// Substitutes `{placeholder}` tokens in one pass, so text coming from
    /// the profile is never scanned for further placeholders. Unknown
    /// tokens are kept as written.
    fn render(&self, template: &str, context: &ConversationContext) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let token = &rest[open..];
            let substituted = token
                .find('}')
                .and_then(|close| self.placeholder(&token[1..close], context).map(|v| (close, v)));
            match substituted {
                Some((close, value)) => {
                    out.push_str(&value);
                    rest = &token[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &token[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn placeholder(&self, key: &str, context: &ConversationContext) -> Option<String> {
        let inst = &self.institutions;
        let value = match key {
            "name" => context.first_name().to_string(),
            "region" => context.region_or_default().to_string(),
            "level" => context.education_level.label().to_string(),
            "interests" if context.interests.is_empty() => "the subjects you enjoy".to_string(),
            "interests" => natural_join(&context.interests),
            "medical_colleges" => natural_join(&inst.medical_colleges),
            "medical_exams" => natural_join(&inst.medical_exams),
            "engineering_colleges" => natural_join(&inst.engineering_colleges),
            "engineering_exams" => natural_join(&inst.engineering_exams),
            "universities" => natural_join(&inst.universities),
            "government_exams" => natural_join(&inst.government_exams),
            _ => return None,
        };
        Some(value)
    }
}

/// `["A", "B", "C"]` → `"A, B and C"`.
fn natural_join(items: &[String]) -> String {
    match items {
        [] => "the options near you".to_string(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}
