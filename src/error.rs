use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `Mentorflow`.
///
/// The decision core never fails for well-typed input, so these variants only
/// cover the I/O edges: configuration, the text generator, and state storage.
/// Internal code keeps using `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum MentorError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Generator ───────────────────────────────────────────────────────
    #[error("generator: {0}")]
    Generator(#[from] GeneratorError),

    // ── State store ─────────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MentorError {
    /// Whether the caller should retry the same turn unchanged.
    ///
    /// Generator failures never advance conversation state, so the retried
    /// turn starts from the exact state the failed one saw.
    pub fn is_retryable_turn(&self) -> bool {
        matches!(self, Self::Generator(_))
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Generator errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator {generator} request failed: {message}")]
    Failed { generator: String, message: String },

    #[error("generator {generator} returned an empty reply")]
    Empty { generator: String },
}

// ─── State store errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("load {key} failed: {message}")]
    Load { key: String, message: String },

    #[error("save {key} failed: {message}")]
    Save { key: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, MentorError>;
