//! Localized phrase tables shared by the prompt compiler and the response
//! sanitizer. Blocklisted phrases are matched case-insensitively; none of the
//! grounded alternatives may contain a blocklisted phrase.

use crate::conversation::{DirectiveAction, Language, MentorTone};

const BLOCKLIST_EN: &[&str] = &[
    "I understand how you feel",
    "I hear you",
    "that must be hard",
    "that must be so hard",
    "your feelings are valid",
    "thank you for sharing",
    "thanks for sharing",
    "I'm here for you",
    "it's okay to feel",
    "as an AI",
    "I'm proud of you",
    "you've got this",
];

const BLOCKLIST_RU: &[&str] = &[
    "я понимаю, что вы чувствуете",
    "я понимаю, что ты чувствуешь",
    "я тебя слышу",
    "я вас слышу",
    "спасибо, что поделились",
    "спасибо, что поделился",
    "спасибо, что поделилась",
    "ваши чувства важны",
    "твои чувства важны",
    "я здесь для тебя",
    "как ИИ",
    "я горжусь тобой",
];

const ALTERNATIVES_EN: &[&str] = &[
    "Let's stay with that for a moment",
    "That sounds concrete",
    "That's a real detail",
    "Noted",
    "Let's look at that closer",
];

const ALTERNATIVES_RU: &[&str] = &[
    "Давай немного побудем с этим",
    "Это звучит конкретно",
    "Это важная деталь",
    "Принято",
    "Давай посмотрим на это внимательнее",
];

pub fn blocklist(language: Language) -> &'static [&'static str] {
    match language {
        Language::English => BLOCKLIST_EN,
        Language::Russian => BLOCKLIST_RU,
    }
}

pub fn grounded_alternatives(language: Language) -> &'static [&'static str] {
    match language {
        Language::English => ALTERNATIVES_EN,
        Language::Russian => ALTERNATIVES_RU,
    }
}

/// Fixed instruction for each directive action.
pub fn action_template(action: DirectiveAction, language: Language) -> &'static str {
    match language {
        Language::English => match action {
            DirectiveAction::Reflect => {
                "Reflect back what the user just said in one or two sentences, using their own words. Do not interpret or advise."
            }
            DirectiveAction::AskQuestion => {
                "Ask exactly one short, open question that helps the user go one step deeper."
            }
            DirectiveAction::Validate => {
                "Acknowledge the user's experience plainly and specifically. Do not ask anything."
            }
            DirectiveAction::MicroTask => {
                "Offer one tiny action the user can do within a minute, right now."
            }
            DirectiveAction::Silence => {
                "Reply with a very short acknowledgement that leaves space for the user to continue."
            }
            DirectiveAction::GiveTask => {
                "Introduce today's task clearly and briefly, in one message, and connect it to today's goal."
            }
            DirectiveAction::Summarize => {
                "Summarize what the user did and noticed today in two or three sentences, tied to today's goal."
            }
            DirectiveAction::CloseDay => {
                "Close today's session: one sentence naming what the user takes away, one sentence of farewell until the next day."
            }
        },
        Language::Russian => match action {
            DirectiveAction::Reflect => {
                "Отрази то, что пользователь только что сказал, в одном-двух предложениях, его же словами. Не интерпретируй и не советуй."
            }
            DirectiveAction::AskQuestion => {
                "Задай ровно один короткий открытый вопрос, который поможет пользователю пойти на шаг глубже."
            }
            DirectiveAction::Validate => {
                "Просто и конкретно признай опыт пользователя. Ничего не спрашивай."
            }
            DirectiveAction::MicroTask => {
                "Предложи одно маленькое действие, которое пользователь может сделать прямо сейчас за минуту."
            }
            DirectiveAction::Silence => {
                "Ответь очень коротким подтверждением, оставляя пользователю пространство продолжить."
            }
            DirectiveAction::GiveTask => {
                "Ясно и коротко, одним сообщением, представь сегодняшнее задание и свяжи его с целью дня."
            }
            DirectiveAction::Summarize => {
                "Подведи итог того, что пользователь сделал и заметил сегодня, в двух-трёх предложениях, связав с целью дня."
            }
            DirectiveAction::CloseDay => {
                "Заверши сегодняшнюю сессию: одно предложение о том, что пользователь уносит с собой, и одно прощальное до следующего дня."
            }
        },
    }
}

pub fn tone_hint(tone: MentorTone, language: Language) -> &'static str {
    match (language, tone) {
        (Language::English, MentorTone::Warm) => "warm and soft",
        (Language::English, MentorTone::Direct) => "direct and clear",
        (Language::English, MentorTone::Playful) => "light and playful",
        (Language::English, MentorTone::Calm) => "calm and unhurried",
        (Language::Russian, MentorTone::Warm) => "тёплый и мягкий",
        (Language::Russian, MentorTone::Direct) => "прямой и ясный",
        (Language::Russian, MentorTone::Playful) => "лёгкий и игривый",
        (Language::Russian, MentorTone::Calm) => "спокойный и неторопливый",
    }
}

/// Section headings and fixed sentences of the compiled prompt.
pub struct PromptLabels {
    pub persona: &'static str,
    pub day: &'static str,
    pub tone: &'static str,
    pub task: &'static str,
    pub goal: &'static str,
    pub recent: &'static str,
    pub directive: &'static str,
    pub focus: &'static str,
    pub instruction: &'static str,
    pub content: &'static str,
    pub rules: &'static str,
    pub word_limit: &'static str,
    pub single_intent: &'static str,
    pub no_questions: &'static str,
    pub reply_language: &'static str,
    pub never_say: &'static str,
    pub avoid_words: &'static str,
    pub alternatives: &'static str,
    pub user_label: &'static str,
    pub mentor_label: &'static str,
}

pub fn labels(language: Language) -> &'static PromptLabels {
    match language {
        Language::English => &LABELS_EN,
        Language::Russian => &LABELS_RU,
    }
}

static LABELS_EN: PromptLabels = PromptLabels {
    persona: "You are {mentor}, a mentor guiding {participant} through a short daily practice.",
    day: "Today is day {day} of {total}.",
    tone: "Tone",
    task: "Today's task",
    goal: "Today's goal",
    recent: "## Recent conversation",
    directive: "## Your move this turn",
    focus: "Focus on",
    instruction: "Instruction",
    content: "Content",
    rules: "## Rules",
    word_limit: "Use at most {max_words} words.",
    single_intent: "Do exactly one thing in this message.",
    no_questions: "Do not ask any questions.",
    reply_language: "Reply in English.",
    never_say: "## Never say",
    avoid_words: "## Do not repeat these words",
    alternatives: "## Prefer grounded phrasing such as",
    user_label: "User",
    mentor_label: "Mentor",
};

static LABELS_RU: PromptLabels = PromptLabels {
    persona: "Ты {mentor}, наставник, который ведёт {participant} через короткую ежедневную практику.",
    day: "Сегодня день {day} из {total}.",
    tone: "Тон",
    task: "Задание дня",
    goal: "Цель дня",
    recent: "## Недавний разговор",
    directive: "## Твой ход в этом сообщении",
    focus: "Фокус",
    instruction: "Инструкция",
    content: "Содержание",
    rules: "## Правила",
    word_limit: "Не больше {max_words} слов.",
    single_intent: "Делай ровно одну вещь в этом сообщении.",
    no_questions: "Не задавай вопросов.",
    reply_language: "Отвечай по-русски.",
    never_say: "## Никогда не говори",
    avoid_words: "## Не повторяй эти слова",
    alternatives: "## Предпочитай приземлённые формулировки, например",
    user_label: "Пользователь",
    mentor_label: "Наставник",
};
