//! Configuration settings for Referat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub gemini: GeminiSettings,
    pub summarization: SummarizationSettings,
    pub action_items: ActionItemSettings,
    pub jobs: JobSettings,
    pub supervisor: SupervisorSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for storing uploaded audio files.
    pub storage_dir: String,
    /// Path to the SQLite database.
    pub db_path: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.referat".to_string(),
            storage_dir: "~/.referat/uploads".to_string(),
            db_path: "~/.referat/referat.db".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Transcription provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProvider {
    /// AssemblyAI remote transcription jobs (default).
    #[default]
    AssemblyAi,
    /// Local Whisper model.
    Whisper,
}

impl std::str::FromStr for TranscriptionProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "assemblyai" => Ok(TranscriptionProvider::AssemblyAi),
            "whisper" => Ok(TranscriptionProvider::Whisper),
            _ => Err(format!("Unsupported transcription provider: {}", s)),
        }
    }
}

impl std::fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionProvider::AssemblyAi => write!(f, "assemblyai"),
            TranscriptionProvider::Whisper => write!(f, "whisper"),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Transcription provider (assemblyai, whisper).
    pub provider: TranscriptionProvider,
    /// Return a deterministic placeholder transcript instead of calling a
    /// provider (test mode).
    pub mock: bool,
    /// Whisper model to load for the local provider.
    pub whisper_model: String,
    /// AssemblyAI provider settings.
    pub assemblyai: AssemblyAiSettings,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProvider::AssemblyAi,
            mock: false,
            whisper_model: "base".to_string(),
            assemblyai: AssemblyAiSettings::default(),
        }
    }
}

/// AssemblyAI API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyAiSettings {
    /// API key. Empty means not configured.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
    /// Optional speech model override.
    pub model: Option<String>,
    /// Seconds to sleep between job polls.
    pub poll_interval_secs: f64,
    /// Wall-clock ceiling for polling before the job is abandoned.
    pub poll_timeout_secs: f64,
}

impl Default for AssemblyAiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.assemblyai.com/v2".to_string(),
            model: None,
            poll_interval_secs: 3.0,
            poll_timeout_secs: 600.0,
        }
    }
}

/// Gemini generative backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// API key. Empty means not configured.
    pub api_key: String,
    /// Model name.
    pub model: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

/// Summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    /// Use the deterministic truncating summarizer instead of Gemini.
    pub mock: bool,
    /// Maximum number of sentences in a summary.
    pub max_sentences: usize,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            mock: false,
            max_sentences: 5,
        }
    }
}

/// Action item extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ActionItemSettings {
    /// Use the rule-based extractor instead of Gemini.
    pub mock: bool,
}

/// Background job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    /// Run processing jobs in the background. When false, jobs execute
    /// synchronously in the caller's context (deterministic testing).
    pub enabled: bool,
    /// Worker pool size: at most this many jobs run concurrently.
    pub workers: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            workers: 2,
        }
    }
}

/// Supervisor integration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Agent name reported in Supervisor envelopes.
    pub agent_name: String,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            agent_name: "meeting_followup_agent".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file, then apply
    /// environment overrides.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default location if None.
    /// Environment variables override file values in either case.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ReferatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("referat")
            .join("config.toml")
    }

    /// Override file-based settings with environment variables. These are the
    /// knobs deployment environments set without shipping a config file.
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = env_var("TRANSCRIPTION_PROVIDER") {
            if let Ok(provider) = value.parse() {
                self.transcription.provider = provider;
            }
        }
        if let Some(value) = env_var("ASSEMBLYAI_API_KEY") {
            self.transcription.assemblyai.api_key = value;
        }
        if let Some(value) = env_var("ASSEMBLYAI_BASE_URL") {
            self.transcription.assemblyai.base_url = value;
        }
        if let Some(value) = env_var("ASSEMBLYAI_MODEL") {
            self.transcription.assemblyai.model = Some(value);
        }
        if let Some(value) = env_var("ASSEMBLYAI_POLL_INTERVAL").and_then(|v| v.parse().ok()) {
            self.transcription.assemblyai.poll_interval_secs = value;
        }
        if let Some(value) = env_var("ASSEMBLYAI_POLL_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.transcription.assemblyai.poll_timeout_secs = value;
        }
        if let Some(value) = env_var("WHISPER_MODEL") {
            self.transcription.whisper_model = value;
        }
        if let Some(value) = env_var("GEMINI_API_KEY") {
            self.gemini.api_key = value;
        }
        if let Some(value) = env_var("GEMINI_MODEL") {
            self.gemini.model = value;
        }
        if let Some(value) = env_var("MOCK_TRANSCRIPTION") {
            self.transcription.mock = parse_bool(&value);
        }
        if let Some(value) = env_var("MOCK_SUMMARY") {
            self.summarization.mock = parse_bool(&value);
        }
        if let Some(value) = env_var("MOCK_ACTION_ITEMS") {
            self.action_items.mock = parse_bool(&value);
        }
        if let Some(value) = env_var("ENABLE_BACKGROUND_JOBS") {
            self.jobs.enabled = parse_bool(&value);
        }
        if let Some(value) = env_var("JOB_WORKERS").and_then(|v| v.parse().ok()) {
            self.jobs.workers = value;
        }
        if let Some(value) = env_var("STORAGE_DIR") {
            self.general.storage_dir = value;
        }
        if let Some(value) = env_var("DATABASE_PATH") {
            self.general.db_path = value;
        }
        if let Some(value) = env_var("SUPERVISOR_AGENT_NAME") {
            self.supervisor.agent_name = value;
        }
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded audio storage directory path.
    pub fn storage_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.storage_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn db_path(&self) -> PathBuf {
        Self::expand_path(&self.general.db_path)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
