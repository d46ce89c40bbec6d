//! Configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_FALLBACK_TEXT: &str = "I'm having trouble connecting right now.";

/// Top-level voice-relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<TranscriptionConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Where `/upload-audio` writes files (default: "uploads").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploads_dir: Option<String>,

    /// Request body limit for multipart uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Speech-to-text (AssemblyAI) configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_timeout_secs: Option<u64>,
}

impl TranscriptionConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(
            &self.api_key,
            &Some(
                self.api_key_env
                    .clone()
                    .unwrap_or_else(|| "ASSEMBLYAI_API_KEY".into()),
            ),
        )
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or("https://api.assemblyai.com")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(1000))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs.unwrap_or(120))
    }
}

/// Text generation (Gemini) configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model name (default: "gemini-1.5-flash").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerationConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(
            &self.api_key,
            &Some(
                self.api_key_env
                    .clone()
                    .unwrap_or_else(|| "GEMINI_API_KEY".into()),
            ),
        )
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com")
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("gemini-1.5-flash")
    }
}

/// Text-to-speech (Murf) configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Default voice ID (default: "en-US-natalie").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,

    /// Output format (default: "MP3").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Speaking style; only sent when set, not every voice supports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Per-call character limit enforced by the provider (default: 3000).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<usize>,
}

impl TtsConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(
            &self.api_key,
            &Some(
                self.api_key_env
                    .clone()
                    .unwrap_or_else(|| "MURF_API_KEY".into()),
            ),
        )
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or("https://api.murf.ai")
    }

    pub fn voice_id(&self) -> &str {
        self.voice_id.as_deref().unwrap_or("en-US-natalie")
    }

    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or("MP3")
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars.unwrap_or(3000)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle time before a session is evicted (default: 3600).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,

    /// Upper bound on live sessions (default: 1000).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sessions: Option<usize>,

    /// How often the gateway sweeps idle sessions (default: 60).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Reply spoken and stored when any pipeline stage fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every provider request (default: 60).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "voice_relay_agent=debug").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: None,
            filters: Vec::new(),
            output: default_log_output(),
        }
    }
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

/// Resolve a secret: check the direct value first, then the env-var reference.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    if let Some(env) = env_var {
        if let Ok(val) = std::env::var(env) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    None
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> crate::error::Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| crate::error::VoiceRelayError::Config(e.to_string()))?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned())
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let substituted = substitute_env_vars(&raw)?;

        json5::from_str(&substituted)
            .map_err(|e| crate::error::VoiceRelayError::Config(e.to_string()))
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    pub fn gateway_port(&self) -> u16 {
        self.gateway.as_ref().map(|g| g.port).unwrap_or(DEFAULT_PORT)
    }

    pub fn gateway_bind(&self) -> String {
        self.gateway
            .as_ref()
            .and_then(|g| g.bind.clone())
            .unwrap_or_else(|| "0.0.0.0".to_string())
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.gateway
            .as_ref()
            .and_then(|g| g.uploads_dir.as_ref())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("uploads"))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.gateway
            .as_ref()
            .and_then(|g| g.max_upload_bytes)
            .unwrap_or(25 * 1024 * 1024)
    }

    pub fn transcription(&self) -> TranscriptionConfig {
        self.transcription.clone().unwrap_or_default()
    }

    pub fn generation(&self) -> GenerationConfig {
        self.generation.clone().unwrap_or_default()
    }

    pub fn tts(&self) -> TtsConfig {
        self.tts.clone().unwrap_or_default()
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(
            self.session
                .as_ref()
                .and_then(|s| s.ttl_secs)
                .unwrap_or(3600),
        )
    }

    pub fn max_sessions(&self) -> usize {
        self.session
            .as_ref()
            .and_then(|s| s.max_sessions)
            .unwrap_or(1000)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.session
                .as_ref()
                .and_then(|s| s.sweep_interval_secs)
                .unwrap_or(60),
        )
    }

    pub fn fallback_text(&self) -> String {
        self.agent
            .as_ref()
            .and_then(|a| a.fallback_text.clone())
            .unwrap_or_else(|| DEFAULT_FALLBACK_TEXT.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http
                .as_ref()
                .and_then(|h| h.request_timeout_secs)
                .unwrap_or(60),
        )
    }

    /// Get a config value by dotted path (e.g. "gateway.port", "tts.voice_id").
    pub fn get_path(&self, path: &str) -> Option<serde_json::Value> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let credentials = [
            ("transcription", self.transcription().resolve_api_key()),
            ("generation", self.generation().resolve_api_key()),
            ("tts", self.tts().resolve_api_key()),
        ];
        for (provider, key) in credentials {
            if key.is_none() {
                warnings.push(format!(
                    "Provider '{provider}' has no API key configured"
                ));
            }
        }

        if let Some(gw) = &self.gateway {
            if gw.port == 0 {
                errors.push("Gateway port cannot be 0".to_string());
            }
        }

        let max_chars = self.tts().max_chars();
        if max_chars == 0 {
            errors.push("tts.max_chars must be greater than 0".to_string());
        } else {
            // The apology is spoken as a single clip.
            let fallback_chars = self.fallback_text().chars().count();
            if fallback_chars > max_chars {
                errors.push(format!(
                    "agent.fallback_text is {fallback_chars} characters, over tts.max_chars ({max_chars})"
                ));
            }
        }

        if self.max_sessions() == 0 {
            errors.push("session.max_sessions must be greater than 0".to_string());
        }

        (warnings, errors)
    }
}

/// Base directory for voice-relay data: `~/.voice_relay/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".voice_relay")
}
