//! Assistant configuration, loadable from TOML with environment overrides.

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration for the assistant core.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// Gemini endpoint settings.
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Chat session settings.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Settings key holding the Gemini API credential.
    #[serde(default = "default_credential_key")]
    pub credential_key: String,
    /// PostgreSQL connection URL. None selects the in-memory store.
    #[serde(default)]
    pub database_url: Option<String>,
}

/// Configuration for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    /// API base URL (overridden in tests to point at a mock server).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name, e.g. "gemini-3-flash-preview".
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature. Zero keeps extraction deterministic.
    #[serde(default)]
    pub temperature: f32,
}

/// Configuration for a chat session.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Upper bound on one interpreter call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// First assistant message of every session.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_credential_key() -> String {
    "gemini_api_key".into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_model() -> String {
    "gemini-3-flash-preview".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_greeting() -> String {
    "Olá! Sou seu assistente Lojista Pro. Como posso ajudar?".into()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: 0.0,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            greeting: default_greeting(),
        }
    }
}

impl ChatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            chat: ChatConfig::default(),
            credential_key: default_credential_key(),
            database_url: None,
        }
    }
}

impl AssistantConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every chat turn fail.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.chat.timeout_secs > 0, "chat.timeout_secs must be at least 1");
        Ok(())
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `GEMINI_BASE_URL`, `GEMINI_MODEL`, `CHAT_TIMEOUT_SECS` and
    /// `DATABASE_URL` from the given lookup. A zero timeout is ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(secs) = lookup("CHAT_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            self.chat.timeout_secs = secs;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url);
        }
        self
    }
}
