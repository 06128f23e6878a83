//! Phase state machine for a single day's guided conversation.
//!
//! Each turn the machine inspects the current [`ConversationState`] and the
//! incoming user text, then emits exactly one [`Decision`]. Phase rules are
//! evaluated first and may force an action outright; only when no rule fires
//! does the weighted [`select_action`] draw decide. Phases move strictly
//! forward: intro → reflection → task → integration.

use super::profile::MentorProfile;
use super::selector::select_action;
use super::signals::{Language, SignalSet, Signals};
use super::types::{Action, ConversationState, Decision, DecisionContext, DirectiveAction, Phase};
use crate::config::PolicyConfig;
use rand::Rng;
use tracing::{debug, info, warn};

/// Maximum characters of user text echoed back as a focus point.
const FOCUS_MAX_CHARS: usize = 160;

pub struct PhaseMachine {
    policy: PolicyConfig,
    signals: SignalSet,
}

impl PhaseMachine {
    pub fn new(policy: PolicyConfig, signals: SignalSet) -> Self {
        Self { policy, signals }
    }

    pub fn with_policy(policy: PolicyConfig) -> Self {
        Self::new(policy, SignalSet::default())
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn signals(&self) -> &SignalSet {
        &self.signals
    }

    /// Decide what the conversation may do this turn.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        state: &ConversationState,
        user_text: &str,
        profile: &MentorProfile,
        rng: &mut R,
    ) -> Decision {
        let signals = self.signals.detect(user_text);
        let turn = Turn {
            text: user_text,
            length: user_text.trim().chars().count(),
            language: Language::detect(user_text),
            signals,
        };

        let decision = match state.phase {
            Phase::Intro => self.decide_intro(&turn),
            Phase::Reflection => self.decide_reflection(state, &turn, profile, rng),
            Phase::Task => self.decide_task(state, &turn, profile, rng),
            Phase::Integration => decide_integration(state, &turn),
        };
        let decision = guard_forward_only(state.phase, decision);

        debug!(
            phase = %decision.phase,
            action = %decision.action,
            next_phase = ?decision.next_phase,
            emotion = signals.emotion,
            completion = signals.completion,
            reason = %decision.reason,
            "conversation.decide"
        );
        decision
    }

    /// Apply a decision to the state it was made from.
    ///
    /// Only a single forward step matching the state's current phase is
    /// honored; anything else leaves the phase untouched.
    pub fn advance_state(
        &self,
        state: &ConversationState,
        decision: &Decision,
        user_text: &str,
    ) -> ConversationState {
        let signals = self.signals.detect(user_text);
        let mut next = state.clone();
        next.total_message_count = next.total_message_count.saturating_add(1);
        next.user_shared_emotion |= signals.emotion;
        next.user_indicated_completion |= signals.completion;

        let target = decision.next_phase.filter(|phase| {
            decision.phase == state.phase && Some(*phase) == state.phase.successor()
        });
        if decision.next_phase.is_some() && target.is_none() {
            warn!(
                current = %state.phase,
                decided_in = %decision.phase,
                requested = ?decision.next_phase,
                "ignoring phase change that is not a single forward step"
            );
        }

        if let Some(phase) = target {
            info!(from = %state.phase, to = %phase, "conversation.phase_transition");
            next.phase = phase;
            next.message_count_in_phase = 0;
            next.questions_asked_in_phase = 0;
        } else {
            next.message_count_in_phase = next.message_count_in_phase.saturating_add(1);
            if decision.action == DirectiveAction::AskQuestion {
                next.questions_asked_in_phase = next.questions_asked_in_phase.saturating_add(1);
            }
        }

        if decision.completes_day() && decision.phase == state.phase {
            info!(total_messages = next.total_message_count, "conversation.day_complete");
            next.day_complete = true;
        }

        next
    }

    fn decide_intro(&self, turn: &Turn<'_>) -> Decision {
        let substantive = turn.length > self.policy.intro_substantive_chars;
        if substantive || turn.signals.emotion {
            let reason = if turn.signals.emotion {
                "intro: emotion detected"
            } else {
                "intro: substantive opening message"
            };
            let mut decision = Decision::new(
                DirectiveAction::Reflect,
                Phase::Intro,
                Some(Phase::Reflection),
                DecisionContext::default(),
                reason,
            )
            .with_focus_point(focus_excerpt(turn.text));
            if turn.signals.emotion {
                decision = decision.with_instruction(localized(
                    turn.language,
                    "Name the feeling the user described, in their own words.",
                    "Назови чувство, которое описал пользователь, его же словами.",
                ));
            }
            return decision;
        }

        Decision::new(
            DirectiveAction::AskQuestion,
            Phase::Intro,
            None,
            DecisionContext::default(),
            "intro: short opening, invite the user in",
        )
        .with_instruction(localized(
            turn.language,
            "Invite the user to share how they are arriving today.",
            "Пригласи пользователя рассказать, с каким состоянием он приходит сегодня.",
        ))
    }

    fn decide_reflection<R: Rng + ?Sized>(
        &self,
        state: &ConversationState,
        turn: &Turn<'_>,
        profile: &MentorProfile,
        rng: &mut R,
    ) -> Decision {
        let enough_turns = state.message_count_in_phase >= self.policy.reflection_turns_before_task;
        let emotional_long =
            turn.signals.emotion && turn.length > self.policy.reflection_emotional_chars;
        if enough_turns || emotional_long {
            let reason = if enough_turns {
                "reflection: enough turns, hand over the task"
            } else {
                "reflection: long emotional message, hand over the task"
            };
            return give_task(state, Phase::Reflection, Some(Phase::Task), reason);
        }

        let drawn = select_action(&profile.action_weights, rng);
        let capped = drawn == Action::AskQuestion
            && state.questions_asked_in_phase >= self.policy.max_questions_per_phase;
        let (action, reason) = if capped {
            (Action::Reflect, "reflection: question cap reached, reflect instead")
        } else {
            (drawn, "reflection: weighted draw")
        };

        Decision::new(
            action.into(),
            Phase::Reflection,
            None,
            DecisionContext::default(),
            reason,
        )
        .with_focus_point(focus_excerpt(turn.text))
    }

    fn decide_task<R: Rng + ?Sized>(
        &self,
        state: &ConversationState,
        turn: &Turn<'_>,
        profile: &MentorProfile,
        rng: &mut R,
    ) -> Decision {
        let long = turn.length > self.policy.task_long_message_chars;
        if turn.signals.completion || long {
            let reason = if turn.signals.completion {
                "task: completion language, summarize"
            } else {
                "task: long report, summarize"
            };
            return Decision::new(
                DirectiveAction::Summarize,
                Phase::Task,
                Some(Phase::Integration),
                DecisionContext::default(),
                reason,
            )
            .with_focus_point(focus_excerpt(turn.text))
            .with_content(state.goal.clone());
        }

        if turn.signals.task_request {
            return give_task(state, Phase::Task, None, "task: user asked what to do, re-issue");
        }

        // The main task is already assigned; a micro-task would compete with it.
        let (action, reason) = match select_action(&profile.action_weights, rng) {
            Action::MicroTask => (Action::Validate, "task: micro_task drawn, downgraded"),
            other => (other, "task: weighted draw"),
        };

        Decision::new(
            action.into(),
            Phase::Task,
            None,
            DecisionContext::default(),
            reason,
        )
        .with_focus_point(focus_excerpt(turn.text))
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::with_policy(PolicyConfig::default())
    }
}

struct Turn<'a> {
    text: &'a str,
    length: usize,
    language: Language,
    signals: Signals,
}

fn decide_integration(state: &ConversationState, turn: &Turn<'_>) -> Decision {
    Decision::new(
        DirectiveAction::CloseDay,
        Phase::Integration,
        None,
        DecisionContext::default(),
        "integration: close the day",
    )
    .with_content(state.goal.clone())
    .with_instruction(localized(
        turn.language,
        "Close the day warmly and briefly; no new questions.",
        "Тепло и коротко заверши день, без новых вопросов.",
    ))
}

fn give_task(
    state: &ConversationState,
    phase: Phase,
    next_phase: Option<Phase>,
    reason: &str,
) -> Decision {
    Decision::new(
        DirectiveAction::GiveTask,
        phase,
        next_phase,
        DecisionContext::default(),
        reason,
    )
    .with_content(state.task.clone())
    .with_focus_point(state.goal.clone())
}

/// Replace any decision whose phase change is not a single forward step.
fn guard_forward_only(current: Phase, decision: Decision) -> Decision {
    let valid_step = decision
        .next_phase
        .is_none_or(|next| Some(next) == current.successor());
    if decision.phase == current && valid_step {
        return decision;
    }

    warn!(
        phase = %current,
        action = %decision.action,
        next_phase = ?decision.next_phase,
        "decision violates phase ordering, falling back"
    );
    Decision::fallback(current, "fallback: decision violated phase ordering")
}

fn focus_excerpt(text: &str) -> String {
    let trimmed = text.trim();
    let first_sentence = trimmed
        .find(['.', '!', '?', '\n'])
        .map_or(trimmed, |idx| &trimmed[..=idx]);
    match first_sentence.char_indices().nth(FOCUS_MAX_CHARS) {
        Some((idx, _)) => format!("{}…", first_sentence[..idx].trim_end()),
        None => first_sentence.trim_end().to_string(),
    }
}

fn localized(language: Language, english: &'static str, russian: &'static str) -> &'static str {
    match language {
        Language::English => english,
        Language::Russian => russian,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::profile::{ActionWeights, MentorStyle};
    use crate::conversation::types::initialize_state;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn profile_with(weights: ActionWeights) -> MentorProfile {
        MentorProfile {
            style: MentorStyle::Gentle,
            tone: None,
            action_weights: weights,
        }
    }

    fn gentle() -> MentorProfile {
        MentorProfile::resolve(MentorStyle::Gentle, None)
    }

    fn state_in(phase: Phase) -> ConversationState {
        let mut state = initialize_state("Write 3 gratitudes", "Build positive affect");
        state.phase = phase;
        state
    }

    #[test]
    fn intro_short_greeting_asks_question() {
        let machine = PhaseMachine::default();
        let state = state_in(Phase::Intro);
        let mut rng = StdRng::seed_from_u64(1);
        let decision = machine.decide(&state, "hi", &gentle(), &mut rng);
        assert_eq!(decision.action, DirectiveAction::AskQuestion);
        assert_eq!(decision.next_phase, None);
        assert!(!decision.completes_day());
    }

    #[test]
    fn intro_emotion_reflects_and_moves_on() {
        let machine = PhaseMachine::default();
        let state = state_in(Phase::Intro);
        let mut rng = StdRng::seed_from_u64(1);
        let decision = machine.decide(&state, "I feel sad", &gentle(), &mut rng);
        assert_eq!(decision.action, DirectiveAction::Reflect);
        assert_eq!(decision.next_phase, Some(Phase::Reflection));
        assert_eq!(decision.context.focus_point.as_deref(), Some("I feel sad"));
        assert!(decision.context.instruction.is_some());
    }

    #[test]
    fn reflection_question_cap_forces_reflect() {
        let machine = PhaseMachine::default();
        let mut state = state_in(Phase::Reflection);
        state.questions_asked_in_phase = machine.policy().max_questions_per_phase;
        let profile = profile_with(ActionWeights::new(0.0, 1.0, 0.0, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(3);
        let decision = machine.decide(&state, "ok", &profile, &mut rng);
        assert_eq!(decision.action, DirectiveAction::Reflect);
        assert_eq!(decision.next_phase, None);
    }

    #[test]
    fn reflection_below_cap_keeps_question() {
        let machine = PhaseMachine::default();
        let state = state_in(Phase::Reflection);
        let profile = profile_with(ActionWeights::new(0.0, 1.0, 0.0, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(3);
        let decision = machine.decide(&state, "ok", &profile, &mut rng);
        assert_eq!(decision.action, DirectiveAction::AskQuestion);
    }

    #[test]
    fn reflection_long_emotional_message_gives_task() {
        let machine = PhaseMachine::default();
        let state = state_in(Phase::Reflection);
        let text = "I feel like everything at work has been piling up and I keep worrying that \
                    I will never catch up with it, and it makes me anxious every single evening.";
        let mut rng = StdRng::seed_from_u64(3);
        let decision = machine.decide(&state, text, &gentle(), &mut rng);
        assert_eq!(decision.action, DirectiveAction::GiveTask);
        assert_eq!(decision.next_phase, Some(Phase::Task));
        assert_eq!(decision.context.content.as_deref(), Some("Write 3 gratitudes"));
    }

    #[test]
    fn task_micro_task_draw_is_downgraded() {
        let machine = PhaseMachine::default();
        let state = state_in(Phase::Task);
        let profile = profile_with(ActionWeights::new(0.0, 0.0, 0.0, 1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(9);
        let decision = machine.decide(&state, "hmm", &profile, &mut rng);
        assert_eq!(decision.action, DirectiveAction::Validate);
        assert_eq!(decision.next_phase, None);
    }

    #[test]
    fn task_request_reissues_task() {
        let machine = PhaseMachine::default();
        let state = state_in(Phase::Task);
        let mut rng = StdRng::seed_from_u64(9);
        let decision = machine.decide(&state, "what should I do?", &gentle(), &mut rng);
        assert_eq!(decision.action, DirectiveAction::GiveTask);
        assert_eq!(decision.next_phase, None);
    }

    #[test]
    fn task_completion_summarizes() {
        let machine = PhaseMachine::default();
        let state = state_in(Phase::Task);
        let mut rng = StdRng::seed_from_u64(9);
        let decision = machine.decide(&state, "Done!", &gentle(), &mut rng);
        assert_eq!(decision.action, DirectiveAction::Summarize);
        assert_eq!(decision.next_phase, Some(Phase::Integration));
        assert_eq!(decision.context.content.as_deref(), Some("Build positive affect"));
    }

    #[test]
    fn advance_resets_counters_on_transition() {
        let machine = PhaseMachine::default();
        let mut state = state_in(Phase::Reflection);
        state.message_count_in_phase = 2;
        state.questions_asked_in_phase = 1;
        let mut rng = StdRng::seed_from_u64(5);
        let decision = machine.decide(&state, "ok", &gentle(), &mut rng);
        let next = machine.advance_state(&state, &decision, "ok");
        assert_eq!(next.phase, Phase::Task);
        assert_eq!(next.message_count_in_phase, 0);
        assert_eq!(next.questions_asked_in_phase, 0);
        assert_eq!(next.total_message_count, state.total_message_count + 1);
    }

    #[test]
    fn advance_counts_questions_within_phase() {
        let machine = PhaseMachine::default();
        let state = state_in(Phase::Intro);
        let mut rng = StdRng::seed_from_u64(5);
        let decision = machine.decide(&state, "hi", &gentle(), &mut rng);
        let next = machine.advance_state(&state, &decision, "hi");
        assert_eq!(next.phase, Phase::Intro);
        assert_eq!(next.message_count_in_phase, 1);
        assert_eq!(next.questions_asked_in_phase, 1);
    }

    #[test]
    fn advance_ignores_backward_or_skipping_transitions() {
        let machine = PhaseMachine::default();
        let state = state_in(Phase::Task);
        let backward = Decision::new(
            DirectiveAction::Reflect,
            Phase::Task,
            Some(Phase::Intro),
            DecisionContext::default(),
            "forged",
        );
        assert_eq!(machine.advance_state(&state, &backward, "x").phase, Phase::Task);

        let intro = state_in(Phase::Intro);
        let skipping = Decision::new(
            DirectiveAction::GiveTask,
            Phase::Intro,
            Some(Phase::Task),
            DecisionContext::default(),
            "forged",
        );
        assert_eq!(machine.advance_state(&intro, &skipping, "x").phase, Phase::Intro);
    }

    #[test]
    fn guard_replaces_out_of_order_decision() {
        let forged = Decision::new(
            DirectiveAction::GiveTask,
            Phase::Intro,
            Some(Phase::Integration),
            DecisionContext::default(),
            "forged",
        );
        let guarded = guard_forward_only(Phase::Intro, forged);
        assert_eq!(guarded.action, DirectiveAction::Validate);
        assert_eq!(guarded.next_phase, None);
        assert_eq!(guarded.phase, Phase::Intro);
    }

    #[test]
    fn close_day_marks_state_complete() {
        let machine = PhaseMachine::default();
        let state = state_in(Phase::Integration);
        let mut rng = StdRng::seed_from_u64(5);
        let decision = machine.decide(&state, "thanks", &gentle(), &mut rng);
        assert!(decision.completes_day());
        let next = machine.advance_state(&state, &decision, "thanks");
        assert!(next.day_complete);
        assert_eq!(next.phase, Phase::Integration);
    }

    #[test]
    fn focus_excerpt_takes_first_sentence() {
        assert_eq!(focus_excerpt("  I slept badly. Then work."), "I slept badly.");
        let long = "a".repeat(FOCUS_MAX_CHARS + 20);
        let excerpt = focus_excerpt(&long);
        assert!(excerpt.ends_with('…'));
        assert_eq!(excerpt.chars().count(), FOCUS_MAX_CHARS + 1);
    }
}
