use mentorflow::conversation::{
    ConversationState, DirectiveAction, MentorProfile, MentorStyle, MentorTone, Phase,
    PhaseMachine, initialize_state,
};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;

const MESSAGES: &[&str] = &[
    "hi",
    "ok",
    "hmm",
    "I feel sad and tired",
    "what should I do?",
    "done",
    "I wrote three things I'm grateful for: coffee, my sister, the walk home.",
    "Мне сегодня тревожно",
    "готово",
    "not sure yet",
];

fn fresh_state() -> ConversationState {
    initialize_state("Write 3 gratitudes", "Build positive affect")
}

fn gentle() -> MentorProfile {
    MentorProfile::resolve(MentorStyle::Gentle, None)
}

#[test]
fn short_greeting_in_intro_asks_a_question() {
    let machine = PhaseMachine::default();
    let mut rng = StdRng::seed_from_u64(0);
    let decision = machine.decide(&fresh_state(), "hi", &gentle(), &mut rng);
    assert_eq!(decision.action, DirectiveAction::AskQuestion);
    assert_eq!(decision.next_phase, None);
}

#[test]
fn emotional_intro_reflects_and_enters_reflection() {
    let machine = PhaseMachine::default();
    let mut rng = StdRng::seed_from_u64(0);
    let text = "Honestly I feel pretty anxious about this week";
    assert!(text.len() < 50);
    let decision = machine.decide(&fresh_state(), text, &gentle(), &mut rng);
    assert_eq!(decision.action, DirectiveAction::Reflect);
    assert_eq!(decision.next_phase, Some(Phase::Reflection));
}

#[test]
fn reflection_after_two_turns_gives_task_for_any_draw() {
    let machine = PhaseMachine::default();
    let mut state = fresh_state();
    state.phase = Phase::Reflection;
    state.message_count_in_phase = 2;
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let decision = machine.decide(&state, "ok", &gentle(), &mut rng);
        assert_eq!(decision.action, DirectiveAction::GiveTask);
        assert_eq!(decision.next_phase, Some(Phase::Task));
        assert_eq!(decision.context.content.as_deref(), Some("Write 3 gratitudes"));
    }
}

#[test]
fn integration_always_closes_the_day() {
    let machine = PhaseMachine::default();
    let mut state = fresh_state();
    state.phase = Phase::Integration;
    for text in MESSAGES {
        let mut rng = StdRng::seed_from_u64(3);
        let decision = machine.decide(&state, text, &gentle(), &mut rng);
        assert_eq!(decision.action, DirectiveAction::CloseDay);
        assert!(decision.completes_day());
        assert_eq!(decision.next_phase, None);
    }
}

#[test]
fn phase_never_regresses_and_completion_tracks_integration() {
    let machine = PhaseMachine::default();
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let style = MentorStyle::iter()
            .nth(rng.random_range(0..4))
            .unwrap_or_default();
        let tone = MentorTone::iter().nth(rng.random_range(0..5));
        let profile = MentorProfile::resolve(style, tone);
        let mut state = fresh_state();

        for _ in 0..25 {
            let text = MESSAGES.choose(&mut rng).copied().unwrap_or("hi");
            let decision = machine.decide(&state, text, &profile, &mut rng);
            assert_eq!(decision.phase, state.phase);
            assert_eq!(decision.completes_day(), decision.phase == Phase::Integration);
            if let Some(next) = decision.next_phase {
                assert_eq!(Some(next), state.phase.successor(), "seed {seed}");
            }

            let next = machine.advance_state(&state, &decision, text);
            assert!(next.phase >= state.phase, "seed {seed}: phase regressed");
            assert_eq!(next.total_message_count, state.total_message_count + 1);
            state = next;
        }
    }
}

#[test]
fn seeded_draws_are_reproducible() {
    let machine = PhaseMachine::default();
    let mut state = fresh_state();
    state.phase = Phase::Reflection;
    let profile = MentorProfile::resolve(MentorStyle::Socratic, Some(MentorTone::Warm));

    for seed in 0..20 {
        let first = machine.decide(&state, "ok", &profile, &mut StdRng::seed_from_u64(seed));
        let second = machine.decide(&state, "ok", &profile, &mut StdRng::seed_from_u64(seed));
        assert_eq!(first, second);
    }
}

#[test]
fn russian_messages_use_russian_keywords() {
    let machine = PhaseMachine::default();
    let mut rng = StdRng::seed_from_u64(0);
    let decision = machine.decide(&fresh_state(), "Мне грустно", &gentle(), &mut rng);
    assert_eq!(decision.action, DirectiveAction::Reflect);

    let mut state = fresh_state();
    state.phase = Phase::Task;
    let decision = machine.decide(&state, "Готово!", &gentle(), &mut rng);
    assert_eq!(decision.action, DirectiveAction::Summarize);
    assert_eq!(decision.next_phase, Some(Phase::Integration));
}

#[test]
fn full_day_walk_ends_complete() {
    let machine = PhaseMachine::default();
    let profile = gentle();
    let mut rng = StdRng::seed_from_u64(11);
    let mut state = fresh_state();
    let script = ["hi", "I feel tired", "ok", "hmm", "sure", "done", "thank you"];
    let mut phases = Vec::new();

    for text in script {
        let decision = machine.decide(&state, text, &profile, &mut rng);
        state = machine.advance_state(&state, &decision, text);
        phases.push(state.phase);
    }

    assert_eq!(
        phases,
        vec![
            Phase::Intro,
            Phase::Reflection,
            Phase::Reflection,
            Phase::Reflection,
            Phase::Task,
            Phase::Integration,
            Phase::Integration,
        ]
    );
    assert!(state.day_complete);
    assert!(state.user_shared_emotion);
    assert!(state.user_indicated_completion);
    assert_eq!(state.total_message_count, 7);
}
