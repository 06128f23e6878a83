use crate::conversation::ConversationState;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::sync::RwLock;

const DEFAULT_PARTICIPANT_ID: &str = "local-default";

/// Identifies one day of one participant's journey.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub participant_id: String,
    pub day_number: u32,
}

impl SessionKey {
    pub fn new(participant_id: &str, day_number: u32) -> Self {
        let normalized = sanitize_participant_id(participant_id);
        Self {
            participant_id: if normalized.is_empty() {
                DEFAULT_PARTICIPANT_ID.to_string()
            } else {
                normalized
            },
            day_number,
        }
    }

    /// File name used by [`JsonFileStateStore`].
    pub fn file_name(&self) -> String {
        format!("{}-day{}.json", self.participant_id, self.day_number)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/day-{}", self.participant_id, self.day_number)
    }
}

pub fn sanitize_participant_id(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    out.trim_matches(['_', '.']).to_string()
}

/// Async persistence contract for per-day conversation state.
pub trait StateStore: Send + Sync {
    fn load<'a>(
        &'a self,
        key: &'a SessionKey,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ConversationState>>> + Send + 'a>>;

    fn save<'a>(
        &'a self,
        key: &'a SessionKey,
        state: &'a ConversationState,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Process-local store, mostly for tests and offline simulation.
#[derive(Default)]
pub struct InMemoryStateStore {
    states: RwLock<HashMap<SessionKey, ConversationState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn load<'a>(
        &'a self,
        key: &'a SessionKey,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ConversationState>>> + Send + 'a>> {
        Box::pin(async move { Ok(self.states.read().await.get(key).cloned()) })
    }

    fn save<'a>(
        &'a self,
        key: &'a SessionKey,
        state: &'a ConversationState,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.states.write().await.insert(key.clone(), state.clone());
            Ok(())
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredState {
    key: SessionKey,
    updated_at: DateTime<Utc>,
    state: ConversationState,
}

/// One JSON file per participant/day under a state directory.
pub struct JsonFileStateStore {
    dir: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &SessionKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl StateStore for JsonFileStateStore {
    fn load<'a>(
        &'a self,
        key: &'a SessionKey,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ConversationState>>> + Send + 'a>> {
        Box::pin(async move {
            let path = self.path_for(key);
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed reading state file: {}", path.display()));
                }
            };
            let stored: StoredState = serde_json::from_str(&raw)
                .with_context(|| format!("failed parsing state file: {}", path.display()))?;
            Ok(Some(stored.state))
        })
    }

    fn save<'a>(
        &'a self,
        key: &'a SessionKey,
        state: &'a ConversationState,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let stored = StoredState {
                key: key.clone(),
                updated_at: Utc::now(),
                state: state.clone(),
            };
            let json = serde_json::to_string_pretty(&stored)
                .context("failed serializing conversation state")?;
            write_atomic(&self.path_for(key), &json).await
        })
    }
}

async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed creating state dir: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, content)
        .await
        .with_context(|| format!("failed writing state temp file: {}", temp_path.display()))?;

    if let Err(rename_error) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(rename_error)
            .with_context(|| format!("failed replacing state file atomically: {}", path.display()));
    }

    Ok(())
}
