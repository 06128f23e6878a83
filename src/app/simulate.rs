//! Offline walk through a day: decisions and prompts without a generator.

use crate::config::Config;
use crate::conversation::{
    ConversationState, DayPlan, Decision, PhaseMachine, resolve_mentor_profile,
};
use crate::llm::types::{ChatMessage, recent_window};
use crate::prompt::{PromptContext, compile_prompt};
use crate::session::turn::{conversation_language, mentor_emotion_words};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SimulatedTurn {
    pub turn: usize,
    pub user_text: String,
    pub decision: Decision,
    pub state: ConversationState,
    #[serde(skip)]
    pub prompt: String,
}

/// Replay `messages` through the decision layer with a seeded draw.
///
/// Prompts are built the way a live turn builds them. The generator is stood
/// in for by a placeholder so the prompt history stays realistic; a completed
/// day stops the replay.
pub fn run_simulation(
    config: &Config,
    plan: &DayPlan,
    day_number: u32,
    messages: &[String],
    seed: u64,
) -> Vec<SimulatedTurn> {
    let machine = PhaseMachine::with_policy(config.policy.clone());
    let profile = resolve_mentor_profile(&config.mentor.style, config.mentor.tone.as_deref());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = ConversationState::new(plan);
    let mut history: Vec<ChatMessage> = Vec::new();
    let mut turns = Vec::with_capacity(messages.len());

    for (idx, text) in messages.iter().enumerate() {
        if state.day_complete {
            tracing::info!(remaining = messages.len() - idx, "day complete, stopping replay");
            break;
        }

        let window = recent_window(&history, config.session.history_window);
        let language = conversation_language(text, window);
        let decision = machine.decide(&state, text, &profile, &mut rng);
        let ctx = PromptContext {
            mentor_name: config.mentor.name.clone(),
            day_number,
            total_days: config.mentor.total_days.max(1),
            tone: profile.tone,
            recent_turns: window.to_vec(),
            history_window: config.session.history_window,
            avoid_words: mentor_emotion_words(machine.signals(), window),
            max_words: config.sanitizer.max_words,
            ..PromptContext::for_state(&state, language)
        };
        let prompt = compile_prompt(&decision, &ctx);
        state = machine.advance_state(&state, &decision, text);

        history.push(ChatMessage::user(text.as_str()));
        history.push(ChatMessage::assistant(format!("<{}>", decision.action)));

        turns.push(SimulatedTurn {
            turn: idx + 1,
            user_text: text.clone(),
            decision,
            state: state.clone(),
            prompt,
        });
    }

    turns
}
