//! Renders a [`Decision`] plus conversation context into the system prompt
//! handed to the generator.
//!
//! Layout:
//! 1. Preamble: persona, day, tone, task/goal, recent turns
//! 2. Directive: the action template followed by the decision's own
//!    focus point, instruction and content, verbatim
//! 3. Rules: word ceiling, single intent, question policy, reply language
//! 4. Blocklist
//! 5. Words not to repeat (optional)
//! 6. Grounded alternatives
//!
//! Pure string assembly; total for any well-typed decision.

use super::phrases::{self, PromptLabels};
use crate::conversation::{ConversationState, Decision, DirectiveAction, Language, MentorTone};
use crate::llm::types::{ChatMessage, MessageRole, recent_window};
use std::fmt::Write;

/// Recent turns rendered into the preamble unless the caller says otherwise.
pub const DEFAULT_HISTORY_WINDOW: usize = 6;

#[derive(Debug, Clone)]
pub struct PromptContext {
    pub participant_name: String,
    pub mentor_name: String,
    pub day_number: u32,
    pub total_days: u32,
    pub tone: Option<MentorTone>,
    pub language: Language,
    pub task: String,
    pub goal: String,
    pub recent_turns: Vec<ChatMessage>,
    /// Upper bound on `recent_turns` rendered into the preamble.
    pub history_window: usize,
    pub avoid_words: Vec<String>,
    pub max_words: usize,
}

impl PromptContext {
    /// Context seeded from the day's state; identity and history are filled in
    /// by the caller.
    pub fn for_state(state: &ConversationState, language: Language) -> Self {
        Self {
            participant_name: String::new(),
            mentor_name: String::new(),
            day_number: 1,
            total_days: 1,
            tone: None,
            language,
            task: state.task.clone(),
            goal: state.goal.clone(),
            recent_turns: Vec::new(),
            history_window: DEFAULT_HISTORY_WINDOW,
            avoid_words: Vec::new(),
            max_words: 80,
        }
    }
}

pub fn compile_prompt(decision: &Decision, ctx: &PromptContext) -> String {
    let labels = phrases::labels(ctx.language);
    let mut prompt = String::with_capacity(2048);

    write_preamble(&mut prompt, ctx, labels);
    write_directive(&mut prompt, decision, ctx.language, labels);
    write_rules(&mut prompt, decision.action, ctx, labels);

    let _ = writeln!(prompt, "{}", labels.never_say);
    for phrase in phrases::blocklist(ctx.language) {
        let _ = writeln!(prompt, "- \"{phrase}\"");
    }
    prompt.push('\n');

    let avoid: Vec<&str> = ctx
        .avoid_words
        .iter()
        .map(|word| word.trim())
        .filter(|word| !word.is_empty())
        .collect();
    if !avoid.is_empty() {
        let _ = writeln!(prompt, "{}", labels.avoid_words);
        let _ = writeln!(prompt, "{}\n", avoid.join(", "));
    }

    let _ = writeln!(prompt, "{}", labels.alternatives);
    for alternative in phrases::grounded_alternatives(ctx.language) {
        let _ = writeln!(prompt, "- \"{alternative}\"");
    }

    prompt.trim_end().to_string()
}

fn write_preamble(prompt: &mut String, ctx: &PromptContext, labels: &PromptLabels) {
    let mentor = non_empty_or(&ctx.mentor_name, labels.mentor_label);
    let participant = non_empty_or(&ctx.participant_name, labels.user_label);
    let _ = writeln!(
        prompt,
        "{}",
        fill(
            labels.persona,
            &[("mentor", mentor), ("participant", participant)]
        )
    );

    let day = ctx.day_number.to_string();
    let total = ctx.total_days.max(ctx.day_number).to_string();
    let _ = writeln!(
        prompt,
        "{}",
        fill(labels.day, &[("day", day.as_str()), ("total", total.as_str())])
    );

    if let Some(tone) = ctx.tone {
        let _ = writeln!(
            prompt,
            "{}: {}",
            labels.tone,
            phrases::tone_hint(tone, ctx.language)
        );
    }
    if !ctx.task.trim().is_empty() {
        let _ = writeln!(prompt, "{}: {}", labels.task, ctx.task.trim());
    }
    if !ctx.goal.trim().is_empty() {
        let _ = writeln!(prompt, "{}: {}", labels.goal, ctx.goal.trim());
    }
    prompt.push('\n');

    let recent = recent_window(&ctx.recent_turns, ctx.history_window);
    if recent.iter().any(|turn| !turn.content.trim().is_empty()) {
        let _ = writeln!(prompt, "{}", labels.recent);
        for turn in recent.iter().filter(|turn| !turn.content.trim().is_empty()) {
            let speaker = match turn.role {
                MessageRole::Assistant => mentor,
                MessageRole::User | MessageRole::System => participant,
            };
            let _ = writeln!(prompt, "{speaker}: {}", turn.content.trim());
        }
        prompt.push('\n');
    }
}

fn write_directive(
    prompt: &mut String,
    decision: &Decision,
    language: Language,
    labels: &PromptLabels,
) {
    let _ = writeln!(prompt, "{}", labels.directive);
    let _ = writeln!(prompt, "{}", phrases::action_template(decision.action, language));

    let context = &decision.context;
    if let Some(focus) = context.focus_point.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(prompt, "{}: {focus}", labels.focus);
    }
    if let Some(instruction) = context.instruction.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(prompt, "{}: {instruction}", labels.instruction);
    }
    if let Some(content) = context.content.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(prompt, "{}: {content}", labels.content);
    }
    prompt.push('\n');
}

fn write_rules(
    prompt: &mut String,
    action: DirectiveAction,
    ctx: &PromptContext,
    labels: &PromptLabels,
) {
    let _ = writeln!(prompt, "{}", labels.rules);
    let max_words = ctx.max_words.to_string();
    let _ = writeln!(
        prompt,
        "- {}",
        fill(labels.word_limit, &[("max_words", max_words.as_str())])
    );
    let _ = writeln!(prompt, "- {}", labels.single_intent);
    if action != DirectiveAction::AskQuestion {
        let _ = writeln!(prompt, "- {}", labels.no_questions);
    }
    let _ = writeln!(prompt, "- {}", labels.reply_language);
    prompt.push('\n');
}

/// Substitutes `{name}` placeholders in a single left-to-right pass, so
/// substituted values are never rescanned. Unknown placeholders stay as is.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let known = tail.find('}').and_then(|end| {
            let name = &tail[1..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (end, *value))
        });
        match known {
            Some((end, value)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}
