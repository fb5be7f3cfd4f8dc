//! Configuration loading, validation, and management for Pathfinder.
//!
//! Loads configuration from `~/.pathfinder/config.toml` with environment
//! variable overrides. Validates all settings at startup so the reply path
//! never has to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.pathfinder/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prior messages forwarded to remote providers
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Connectivity assumed before the first signal arrives
    #[serde(default = "default_true")]
    pub initial_online: bool,

    /// Skip remote providers entirely
    #[serde(default)]
    pub force_offline: bool,

    /// Outbound call spacing
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Remote providers, tried in `priority` order
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,

    /// Offline responder settings
    #[serde(default)]
    pub offline: OfflineConfig,

    /// Connectivity probe settings
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
}

fn default_history_window() -> usize {
    6
}
fn default_true() -> bool {
    true
}

/// Which calls share a rate-limit slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingScope {
    /// One uniform spacing between any two outbound calls
    #[default]
    Global,
    /// Spacing tracked independently per provider id
    PerProvider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_min_spacing_ms")]
    pub min_spacing_ms: u64,

    #[serde(default)]
    pub scope: SpacingScope,
}

fn default_min_spacing_ms() -> u64 {
    1000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_spacing_ms: default_min_spacing_ms(),
            scope: SpacingScope::Global,
        }
    }
}

/// Wire protocol spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// `/chat/completions` (Groq, OpenAI, OpenRouter, Together, ...)
    OpenaiCompat,
    /// Google Gemini `generateContent`
    Gemini,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,

    pub kind: ProviderKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Lower is tried first; ties keep file order
    #[serde(default)]
    pub priority: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Confidence declared for this provider's replies
    #[serde(default = "default_provider_confidence")]
    pub confidence: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_timeout_secs() -> u64 {
    15
}
fn default_provider_confidence() -> f32 {
    0.95
}
fn default_max_tokens() -> u32 {
    512
}
fn default_temperature() -> f32 {
    0.7
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            id: "provider_a".into(),
            kind: ProviderKind::OpenaiCompat,
            api_url: Some("https://api.groq.com/openai/v1".into()),
            api_key: None,
            api_key_env: Some("GROQ_API_KEY".into()),
            model: Some("llama-3.1-8b-instant".into()),
            priority: 0,
            timeout_secs: default_timeout_secs(),
            confidence: 0.95,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            enabled: true,
        },
        ProviderConfig {
            id: "provider_b".into(),
            kind: ProviderKind::Gemini,
            api_url: Some("https://generativelanguage.googleapis.com/v1beta".into()),
            api_key: None,
            api_key_env: Some("GEMINI_API_KEY".into()),
            model: Some("gemini-1.5-flash".into()),
            priority: 1,
            timeout_secs: 20,
            confidence: 0.92,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            enabled: true,
        },
    ]
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("api_key_env", &self.api_key_env)
            .field("model", &self.model)
            .field("priority", &self.priority)
            .field("timeout_secs", &self.timeout_secs)
            .field("confidence", &self.confidence)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl ProviderConfig {
    /// Base URL, falling back to the well-known endpoint for the kind.
    pub fn base_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| default_base_url(self.kind).into())
            .trim_end_matches('/')
            .to_string()
    }

    /// Model, falling back to a sensible default for the kind.
    pub fn model_name(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.kind {
            ProviderKind::OpenaiCompat => "llama-3.1-8b-instant".into(),
            ProviderKind::Gemini => "gemini-1.5-flash".into(),
        })
    }

    /// Non-empty API key, if one is configured.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key.clone().filter(|k| !k.trim().is_empty())
    }
}

/// Get the default base URL for a provider kind.
fn default_base_url(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenaiCompat => "https://api.groq.com/openai/v1",
        ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
    }
}

/// Offline responder settings: confidence policy and the regional
/// institutions its templates name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Confidence of the generic encouragement replies
    #[serde(default = "default_generic_confidence")]
    pub generic_confidence: f32,

    /// Confidence when the online path broke unexpectedly
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f32,

    /// Per-rule confidence overrides, keyed by rule name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rule_confidence: BTreeMap<String, f32>,

    #[serde(default = "default_medical_colleges")]
    pub medical_colleges: Vec<String>,

    #[serde(default = "default_medical_exams")]
    pub medical_exams: Vec<String>,

    #[serde(default = "default_engineering_colleges")]
    pub engineering_colleges: Vec<String>,

    #[serde(default = "default_engineering_exams")]
    pub engineering_exams: Vec<String>,

    #[serde(default = "default_universities")]
    pub universities: Vec<String>,

    #[serde(default = "default_government_exams")]
    pub government_exams: Vec<String>,
}

fn default_generic_confidence() -> f32 {
    0.6
}
fn default_fallback_confidence() -> f32 {
    0.5
}
fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
fn default_medical_colleges() -> Vec<String> {
    strings(&["GMC Srinagar", "SKIMS Soura", "GMC Jammu"])
}
fn default_medical_exams() -> Vec<String> {
    strings(&["NEET-UG"])
}
fn default_engineering_colleges() -> Vec<String> {
    strings(&["NIT Srinagar", "IIT Jammu", "SMVDU Katra"])
}
fn default_engineering_exams() -> Vec<String> {
    strings(&["JEE Main", "JKCET"])
}
fn default_universities() -> Vec<String> {
    strings(&["University of Kashmir", "University of Jammu", "Central University of Kashmir"])
}
fn default_government_exams() -> Vec<String> {
    strings(&["JKSSB", "JKPSC", "UPSC Civil Services"])
}

/// Built-in offline rules and their confidence, in evaluation order.
pub const BUILTIN_RULE_CONFIDENCE: &[(&str, f32)] = &[
    ("medical", 0.9),
    ("engineering", 0.9),
    ("teaching", 0.85),
    ("stream_selection", 0.85),
    ("after_twelfth", 0.85),
    ("government", 0.85),
    ("commerce", 0.8),
    ("arts", 0.8),
    ("interests", 0.8),
    ("greeting", 0.8),
];

impl OfflineConfig {
    /// Effective confidence of a built-in rule; `None` for unknown names.
    pub fn rule_confidence_for(&self, rule: &str) -> Option<f32> {
        let (_, builtin) = BUILTIN_RULE_CONFIDENCE.iter().find(|(name, _)| *name == rule)?;
        Some(self.rule_confidence.get(rule).copied().unwrap_or(*builtin))
    }

    /// Highest confidence any offline reply can carry.
    pub fn highest_confidence(&self) -> f32 {
        BUILTIN_RULE_CONFIDENCE
            .iter()
            .filter_map(|(name, _)| self.rule_confidence_for(name))
            .fold(self.generic_confidence, f32::max)
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            generic_confidence: default_generic_confidence(),
            fallback_confidence: default_fallback_confidence(),
            rule_confidence: BTreeMap::new(),
            medical_colleges: default_medical_colleges(),
            medical_exams: default_medical_exams(),
            engineering_colleges: default_engineering_colleges(),
            engineering_exams: default_engineering_exams(),
            universities: default_universities(),
            government_exams: default_government_exams(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// URL polled to decide whether we are online; `None` disables probing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_url: Option<String>,

    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,
}

fn default_probe_interval() -> u64 {
    30
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: None,
            probe_interval_secs: default_probe_interval(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.pathfinder/config.toml),
    /// then apply environment overrides from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognized variables:
    /// - `PATHFINDER_FORCE_OFFLINE` (`1`/`true`/`yes`/`on`)
    /// - `PATHFINDER_MIN_SPACING_MS`
    /// - `PATHFINDER_HISTORY_WINDOW`
    /// - `PATHFINDER_REQUEST_TIMEOUT_SECS` (every provider)
    /// - `PATHFINDER_<ID>_API_KEY`, `PATHFINDER_<ID>_API_URL`
    /// - each provider's `api_key_env` when no key is configured
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PATHFINDER_FORCE_OFFLINE") {
            self.force_offline = parse_bool(&value);
        }

        if let Some(value) = lookup("PATHFINDER_MIN_SPACING_MS") {
            self.rate_limit.min_spacing_ms = parse_number("PATHFINDER_MIN_SPACING_MS", &value)?;
        }

        if let Some(value) = lookup("PATHFINDER_HISTORY_WINDOW") {
            self.history_window = parse_number("PATHFINDER_HISTORY_WINDOW", &value)?;
        }

        if let Some(value) = lookup("PATHFINDER_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_number("PATHFINDER_REQUEST_TIMEOUT_SECS", &value)?;
            for provider in &mut self.providers {
                provider.timeout_secs = secs;
            }
        }

        for provider in &mut self.providers {
            let prefix = format!("PATHFINDER_{}", env_key(&provider.id));

            if let Some(url) = lookup(&format!("{prefix}_API_URL")) {
                provider.api_url = Some(url);
            }

            if provider.resolved_api_key().is_none() {
                provider.api_key = lookup(&format!("{prefix}_API_KEY"))
                    .or_else(|| provider.api_key_env.as_deref().and_then(&lookup))
                    .filter(|k| !k.trim().is_empty());
            }
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".pathfinder")
    }

    /// Enabled providers sorted by priority; ties keep file order.
    pub fn provider_chain(&self) -> Vec<&ProviderConfig> {
        let mut chain: Vec<&ProviderConfig> = self.providers.iter().filter(|p| p.enabled).collect();
        chain.sort_by_key(|p| p.priority);
        chain
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.min_spacing_ms == 0 {
            return Err(ConfigError::ValidationError(
                "rate_limit.min_spacing_ms must be > 0; provider quotas depend on it".into(),
            ));
        }

        let offline = &self.offline;
        for (name, value) in [
            ("offline.generic_confidence", offline.generic_confidence),
            ("offline.fallback_confidence", offline.fallback_confidence),
        ] {
            check_unit_interval(name, value)?;
        }
        if offline.fallback_confidence > offline.generic_confidence {
            return Err(ConfigError::ValidationError(
                "offline.fallback_confidence must not exceed offline.generic_confidence".into(),
            ));
        }

        for (rule, value) in &offline.rule_confidence {
            if !BUILTIN_RULE_CONFIDENCE.iter().any(|(name, _)| name == rule) {
                return Err(ConfigError::ValidationError(format!(
                    "offline.rule_confidence.{rule} does not name a built-in rule"
                )));
            }
            check_unit_interval(&format!("offline.rule_confidence.{rule}"), *value)?;
        }
        for (rule, _) in BUILTIN_RULE_CONFIDENCE {
            let value = offline.rule_confidence_for(rule).unwrap_or_default();
            if value < offline.generic_confidence {
                return Err(ConfigError::ValidationError(format!(
                    "offline rule '{rule}' confidence ({value}) must not be below offline.generic_confidence"
                )));
            }
        }
        let highest_offline = offline.highest_confidence();

        if self.connectivity.probe_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "connectivity.probe_interval_secs must be > 0".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for provider in &self.providers {
            if provider.id.trim().is_empty() {
                return Err(ConfigError::ValidationError("provider id must not be empty".into()));
            }
            if matches!(provider.id.as_str(), "offline" | "fallback") {
                return Err(ConfigError::ValidationError(format!(
                    "provider id '{}' is reserved",
                    provider.id
                )));
            }
            if !seen.insert(provider.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate provider id '{}'",
                    provider.id
                )));
            }
            if provider.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{}.timeout_secs must be > 0",
                    provider.id
                )));
            }
            check_unit_interval(&format!("providers.{}.confidence", provider.id), provider.confidence)?;
            if provider.confidence < highest_offline {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{}.confidence ({}) must not be below offline confidence ({})",
                    provider.id, provider.confidence, highest_offline
                )));
            }
            if !(0.0..=2.0).contains(&provider.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{}.temperature must be between 0.0 and 2.0",
                    provider.id
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            initial_online: true,
            force_offline: false,
            rate_limit: RateLimitConfig::default(),
            providers: default_providers(),
            offline: OfflineConfig::default(),
            connectivity: ConnectivityConfig::default(),
        }
    }
}

fn check_unit_interval(name: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{name} must be between 0.0 and 1.0"
        )))
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvError {
        var: var.to_string(),
        reason: format!("'{value}' is not a valid number"),
    })
}

/// `provider-a` → `PROVIDER_A`
fn env_key(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid value in environment variable {var}: {reason}")]
    EnvError { var: String, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
