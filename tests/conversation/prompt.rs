use mentorflow::conversation::{
    Decision, DecisionContext, DirectiveAction, Language, MentorTone, Phase, initialize_state,
};
use mentorflow::llm::ChatMessage;
use mentorflow::prompt::phrases::{blocklist, grounded_alternatives};
use mentorflow::prompt::{PromptContext, compile_prompt};
use strum::IntoEnumIterator;

fn context(language: Language) -> PromptContext {
    let state = initialize_state("Write 3 gratitudes", "Build positive affect");
    PromptContext {
        participant_name: "Sam".into(),
        mentor_name: "Ada".into(),
        day_number: 3,
        total_days: 7,
        tone: Some(MentorTone::Warm),
        recent_turns: vec![
            ChatMessage::user("I slept badly"),
            ChatMessage::assistant("Noted."),
        ],
        max_words: 60,
        ..PromptContext::for_state(&state, language)
    }
}

#[test]
fn compiles_for_every_action_phase_and_language() {
    for language in [Language::English, Language::Russian] {
        let ctx = context(language);
        for phase in Phase::iter() {
            for action in DirectiveAction::iter() {
                let decision =
                    Decision::new(action, phase, None, DecisionContext::default(), "grid");
                let prompt = compile_prompt(&decision, &ctx);
                assert!(!prompt.is_empty());
                for phrase in blocklist(language) {
                    assert!(prompt.contains(phrase), "{phrase} missing for {action}");
                }
                for alternative in grounded_alternatives(language) {
                    assert!(prompt.contains(alternative));
                }
            }
        }
    }
}

#[test]
fn identity_day_and_history_are_in_the_preamble() {
    let decision = Decision::fallback(Phase::Reflection, "test");
    let prompt = compile_prompt(&decision, &context(Language::English));
    assert!(prompt.contains("You are Ada, a mentor guiding Sam"));
    assert!(prompt.contains("Today is day 3 of 7."));
    assert!(prompt.contains("Tone: warm and soft"));
    assert!(prompt.contains("Today's goal: Build positive affect"));
    assert!(prompt.contains("Sam: I slept badly"));
    assert!(prompt.contains("Ada: Noted."));
    assert!(prompt.contains("Use at most 60 words."));
}

#[test]
fn decision_text_is_carried_verbatim() {
    let decision = Decision::new(
        DirectiveAction::Summarize,
        Phase::Task,
        Some(Phase::Integration),
        DecisionContext::default(),
        "test",
    )
    .with_focus_point("coffee, my sister, the walk home")
    .with_content("Build positive affect")
    .with_instruction("Mention one of the three items by name.");
    let prompt = compile_prompt(&decision, &context(Language::English));
    assert!(prompt.contains("Focus on: coffee, my sister, the walk home"));
    assert!(prompt.contains("Instruction: Mention one of the three items by name."));
    assert!(prompt.contains("Content: Build positive affect"));
}

#[test]
fn avoid_words_are_listed_once_trimmed() {
    let mut ctx = context(Language::English);
    ctx.avoid_words = vec!["tired".into(), "  ".into(), "anxious".into()];
    let prompt = compile_prompt(&Decision::fallback(Phase::Intro, "t"), &ctx);
    assert!(prompt.contains("## Do not repeat these words\ntired, anxious\n"));
}
