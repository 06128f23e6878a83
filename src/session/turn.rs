//! One conversational turn, end to end.
//!
//! Turns for the same participant/day run strictly one at a time; turns for
//! different keys proceed independently. State is written back only after the
//! generator returned a usable reply, so a failed or cancelled turn can be
//! retried against the exact state it started from.

use super::store::{SessionKey, StateStore};
use crate::config::Config;
use crate::conversation::{
    ConversationState, DayPlan, Decision, Language, MentorProfile, PhaseMachine, SignalSet,
    resolve_mentor_profile,
};
use crate::error::{GeneratorError, Result, StoreError};
use crate::llm::postprocess::ResponseSanitizer;
use crate::llm::traits::Generator;
use crate::llm::types::{ChatMessage, MessageRole, recent_window};
use crate::prompt::{PromptContext, compile_prompt};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub user_text: String,
    /// Prior turns of today's conversation, oldest first, excluding `user_text`.
    pub recent_turns: Vec<ChatMessage>,
    pub participant_name: String,
    pub day: DayPlan,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub decision: Decision,
    pub state: ConversationState,
    pub day_complete: bool,
}

pub struct TurnEngine {
    machine: PhaseMachine,
    profile: MentorProfile,
    generator: Arc<dyn Generator>,
    sanitizer: ResponseSanitizer,
    store: Arc<dyn StateStore>,
    locks: Mutex<HashMap<SessionKey, Arc<Mutex<()>>>>,
    mentor_name: String,
    total_days: u32,
    history_window: usize,
}

impl TurnEngine {
    pub fn new(
        machine: PhaseMachine,
        profile: MentorProfile,
        generator: Arc<dyn Generator>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            machine,
            profile,
            generator,
            sanitizer: ResponseSanitizer::default(),
            store,
            locks: Mutex::new(HashMap::new()),
            mentor_name: String::new(),
            total_days: 1,
            history_window: crate::prompt::DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn from_config(
        config: &Config,
        generator: Arc<dyn Generator>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        let profile = resolve_mentor_profile(&config.mentor.style, config.mentor.tone.as_deref());
        Self::new(
            PhaseMachine::with_policy(config.policy.clone()),
            profile,
            generator,
            store,
        )
        .with_sanitizer(ResponseSanitizer::from_config(&config.sanitizer))
        .with_mentor_name(&config.mentor.name)
        .with_total_days(config.mentor.total_days)
        .with_history_window(config.session.history_window)
    }

    pub fn with_sanitizer(mut self, sanitizer: ResponseSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_mentor_name(mut self, name: &str) -> Self {
        self.mentor_name = name.to_string();
        self
    }

    pub fn with_total_days(mut self, total_days: u32) -> Self {
        self.total_days = total_days.max(1);
        self
    }

    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    pub fn profile(&self) -> &MentorProfile {
        &self.profile
    }

    /// Persisted state for `key`, if any turn has completed yet.
    pub async fn state(&self, key: &SessionKey) -> Result<Option<ConversationState>> {
        self.store.load(key).await.map_err(|e| {
            StoreError::Load {
                key: key.to_string(),
                message: format!("{e:#}"),
            }
            .into()
        })
    }

    pub async fn run_turn<R: Rng + ?Sized>(
        &self,
        key: &SessionKey,
        request: TurnRequest,
        rng: &mut R,
    ) -> Result<TurnOutcome> {
        let lock = self.lock_for(key).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.run_locked(key, request, rng).await
        };
        self.release_lock(key, lock).await;
        outcome
    }

    async fn run_locked<R: Rng + ?Sized>(
        &self,
        key: &SessionKey,
        request: TurnRequest,
        rng: &mut R,
    ) -> Result<TurnOutcome> {
        let state = self
            .state(key)
            .await?
            .unwrap_or_else(|| ConversationState::new(&request.day));
        if state.day_complete {
            tracing::debug!(key = %key, "turn on an already completed day");
        }

        let user_text = request.user_text.as_str();
        let history = recent_window(&request.recent_turns, self.history_window);
        let language = conversation_language(user_text, history);
        let decision = self.machine.decide(&state, user_text, &self.profile, rng);

        let ctx = PromptContext {
            participant_name: request.participant_name.clone(),
            mentor_name: self.mentor_name.clone(),
            day_number: key.day_number,
            total_days: self.total_days,
            tone: self.profile.tone,
            recent_turns: history.to_vec(),
            history_window: self.history_window,
            avoid_words: mentor_emotion_words(self.machine.signals(), history),
            max_words: self.sanitizer.max_words(),
            ..PromptContext::for_state(&state, language)
        };
        let system_prompt = compile_prompt(&decision, &ctx);

        let mut messages = history.to_vec();
        messages.push(ChatMessage::user(user_text));

        let raw = self
            .generator
            .generate(&system_prompt, &messages)
            .await
            .map_err(|e| GeneratorError::Failed {
                generator: self.generator.name().to_string(),
                message: format!("{e:#}"),
            })?;

        let reply = self.sanitizer.process_with_rng(&raw, language, rng);
        if reply.is_empty() {
            return Err(GeneratorError::Empty {
                generator: self.generator.name().to_string(),
            }
            .into());
        }

        let next = self.machine.advance_state(&state, &decision, user_text);
        self.store
            .save(key, &next)
            .await
            .map_err(|e| StoreError::Save {
                key: key.to_string(),
                message: format!("{e:#}"),
            })?;

        tracing::info!(
            key = %key,
            phase = %next.phase,
            action = %decision.action,
            language = %language,
            day_complete = next.day_complete,
            "turn.completed"
        );

        Ok(TurnOutcome {
            reply,
            day_complete: next.day_complete,
            decision,
            state: next,
        })
    }

    async fn lock_for(&self, key: &SessionKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Drops the per-key lock once no other turn holds or waits on it.
    async fn release_lock(&self, key: &SessionKey, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // Clones are only handed out under `locks`; two means the map and us.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }
}

/// Reply language for a turn: the user's message when it commits to one,
/// otherwise the latest user turn in `history` that does.
pub(crate) fn conversation_language(user_text: &str, history: &[ChatMessage]) -> Language {
    Language::detect_in_conversation(
        user_text,
        history
            .iter()
            .filter(|message| message.role == MessageRole::User)
            .map(|message| message.content.as_str()),
    )
}

/// Emotion words the mentor already used in `history`, first occurrence order.
pub(crate) fn mentor_emotion_words(signals: &SignalSet, history: &[ChatMessage]) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for message in history.iter().filter(|m| m.role == MessageRole::Assistant) {
        for word in signals.emotion_words(&message.content) {
            if !words.contains(&word) {
                words.push(word);
            }
        }
    }
    words
}
