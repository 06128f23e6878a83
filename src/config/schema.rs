use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub mentor: MentorConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub sanitizer: SanitizerConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_generator_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_generator_model")]
    pub model: String,
    #[serde(default = "default_generator_temperature")]
    pub temperature: f64,
    #[serde(default = "default_generator_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_generator_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

fn default_generator_model() -> String {
    "anthropic/claude-sonnet-4-20250514".into()
}

fn default_generator_temperature() -> f64 {
    0.7
}

fn default_generator_timeout_secs() -> u64 {
    60
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_generator_base_url(),
            api_key: None,
            model: default_generator_model(),
            temperature: default_generator_temperature(),
            timeout_secs: default_generator_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default = "default_generator_retries")]
    pub generator_retries: u32,
    #[serde(default = "default_generator_backoff_ms")]
    pub generator_backoff_ms: u64,
}

fn default_generator_retries() -> u32 {
    2
}

fn default_generator_backoff_ms() -> u64 {
    500
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            generator_retries: default_generator_retries(),
            generator_backoff_ms: default_generator_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorConfig {
    #[serde(default = "default_mentor_name")]
    pub name: String,
    /// Resolved against the closed style set; unknown values use the default.
    #[serde(default = "default_mentor_style")]
    pub style: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default = "default_total_days")]
    pub total_days: u32,
}

fn default_mentor_name() -> String {
    "Mentor".into()
}

fn default_mentor_style() -> String {
    "gentle".into()
}

fn default_total_days() -> u32 {
    7
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            name: default_mentor_name(),
            style: default_mentor_style(),
            tone: None,
            total_days: default_total_days(),
        }
    }
}

/// Tunable thresholds of the phase state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Intro messages longer than this (chars) count as a real opening.
    #[serde(default = "default_intro_substantive_chars")]
    pub intro_substantive_chars: usize,
    /// Reflection turns after which the day's task is handed over.
    #[serde(default = "default_reflection_turns_before_task")]
    pub reflection_turns_before_task: u32,
    /// Emotional reflection messages longer than this hand over the task early.
    #[serde(default = "default_reflection_emotional_chars")]
    pub reflection_emotional_chars: usize,
    #[serde(default = "default_max_questions_per_phase")]
    pub max_questions_per_phase: u32,
    /// Task-phase messages longer than this are treated as a report.
    #[serde(default = "default_task_long_message_chars")]
    pub task_long_message_chars: usize,
}

fn default_intro_substantive_chars() -> usize {
    20
}

fn default_reflection_turns_before_task() -> u32 {
    2
}

fn default_reflection_emotional_chars() -> usize {
    100
}

fn default_max_questions_per_phase() -> u32 {
    2
}

fn default_task_long_message_chars() -> usize {
    200
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            intro_substantive_chars: default_intro_substantive_chars(),
            reflection_turns_before_task: default_reflection_turns_before_task(),
            reflection_emotional_chars: default_reflection_emotional_chars(),
            max_questions_per_phase: default_max_questions_per_phase(),
            task_long_message_chars: default_task_long_message_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizerConfig {
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

fn default_max_words() -> usize {
    80
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory for persisted conversation state; defaults next to config.toml.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_history_window() -> usize {
    6
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            history_window: default_history_window(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());

        Self {
            config_path: home.join(".mentorflow").join("config.toml"),
            generator: GeneratorConfig::default(),
            reliability: ReliabilityConfig::default(),
            mentor: MentorConfig::default(),
            policy: PolicyConfig::default(),
            sanitizer: SanitizerConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let mentorflow_dir = home.join(".mentorflow");
        let config_path = mentorflow_dir.join("config.toml");

        if !mentorflow_dir.exists() {
            fs::create_dir_all(&mentorflow_dir)
                .context("Failed to create .mentorflow directory")?;
        }

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Load(e.to_string()))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("MENTORFLOW_API_KEY") {
            if !key.is_empty() {
                self.generator.api_key = Some(key);
            }
        }

        if let Ok(model) = std::env::var("MENTORFLOW_MODEL") {
            if !model.is_empty() {
                self.generator.model = model;
            }
        }

        if let Ok(base_url) = std::env::var("MENTORFLOW_BASE_URL") {
            if !base_url.is_empty() {
                self.generator.base_url = base_url;
            }
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.sanitizer.max_words == 0 {
            return Err(ConfigError::Validation(
                "sanitizer.max_words must be greater than 0".into(),
            ));
        }
        if self.mentor.total_days == 0 {
            return Err(ConfigError::Validation(
                "mentor.total_days must be greater than 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generator.temperature) {
            return Err(ConfigError::Validation(format!(
                "generator.temperature must be within [0, 2], got {}",
                self.generator.temperature
            )));
        }
        if self.session.history_window == 0 {
            return Err(ConfigError::Validation(
                "session.history_window must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Directory holding persisted conversation state.
    pub fn state_dir(&self) -> PathBuf {
        self.session.state_dir.clone().unwrap_or_else(|| {
            self.config_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("state")
        })
    }
}
