//! Shallow signal detection over raw user text.
//!
//! Detection is a keyword gate, not a classifier: each detector lowercases the
//! text and checks for substrings from one of two keyword lists, chosen by a
//! script test. Anything smarter plugs in through [`SignalDetector`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// Language: binary script-based dispatch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    /// Russian when any Cyrillic code point is present, English otherwise.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_cyrillic) {
            Self::Russian
        } else {
            Self::English
        }
    }

    /// Language `text` commits to, if any. Cyrillic always commits; Latin text
    /// needs at least [`MIN_LATIN_WORDS`] words, so "ok" or "hmm" stay neutral.
    pub fn classify(text: &str) -> Option<Self> {
        if text.chars().any(is_cyrillic) {
            return Some(Self::Russian);
        }
        let latin_words = text
            .split_whitespace()
            .filter(|word| word.chars().any(|ch| ch.is_ascii_alphabetic()))
            .count();
        (latin_words >= MIN_LATIN_WORDS).then_some(Self::English)
    }

    /// Language of `text` within a conversation. Neutral text inherits the
    /// language of the latest earlier user message that committed to one.
    pub fn detect_in_conversation<'a, I>(text: &str, earlier_user_texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: DoubleEndedIterator,
    {
        Self::classify(text)
            .or_else(|| {
                earlier_user_texts
                    .into_iter()
                    .rev()
                    .find_map(Self::classify)
            })
            .unwrap_or_else(|| Self::detect(text))
    }
}

/// Latin words needed before a message counts as English on its own.
pub const MIN_LATIN_WORDS: usize = 2;

fn is_cyrillic(ch: char) -> bool {
    matches!(ch, '\u{0400}'..='\u{04FF}' | '\u{0500}'..='\u{052F}')
}

const EMOTION_EN: &[&str] = &[
    "feel", "sad", "anxious", "anxiety", "afraid", "scared", "angry", "lonely", "tired",
    "overwhelm", "happy", "grateful", "hurt", "upset", "stress", "worried", "frustrat", "ashamed",
    "joy", "cry", "nervous", "exhausted",
];

const EMOTION_RU: &[&str] = &[
    "чувств", "грус", "тревог", "страш", "боюсь", "злюсь", "злость", "одинок", "устал", "счаст",
    "благодар", "обид", "больно", "пережива", "плач", "стыд", "радост", "нервн",
];

const COMPLETION_EN: &[&str] = &[
    "done",
    "finished",
    "completed",
    "i did it",
    "i've written",
    "i have written",
    "wrote them",
];

const COMPLETION_RU: &[&str] = &[
    "готово",
    "сделал",
    "закончил",
    "выполнил",
    "написал",
];

const TASK_REQUEST_EN: &[&str] = &[
    "what should i do",
    "what do i do",
    "what's the task",
    "what is the task",
    "what was the task",
    "remind me the task",
];

const TASK_REQUEST_RU: &[&str] = &[
    "что делать",
    "что мне делать",
    "какое задание",
    "что нужно сделать",
    "напомни задание",
];

/// Boolean gate over raw user text.
pub trait SignalDetector: Send + Sync {
    /// Short identifier used in decision logs.
    fn name(&self) -> &str;

    fn detect(&self, text: &str) -> bool;
}

/// Substring matcher with one keyword list per script.
#[derive(Debug, Clone)]
pub struct KeywordDetector {
    name: &'static str,
    latin: Vec<String>,
    cyrillic: Vec<String>,
}

impl KeywordDetector {
    pub fn new(name: &'static str, latin: &[&str], cyrillic: &[&str]) -> Self {
        Self {
            name,
            latin: latin.iter().map(|word| word.to_lowercase()).collect(),
            cyrillic: cyrillic.iter().map(|word| word.to_lowercase()).collect(),
        }
    }

    pub fn emotion() -> Self {
        Self::new("emotion", EMOTION_EN, EMOTION_RU)
    }

    pub fn completion() -> Self {
        Self::new("completion", COMPLETION_EN, COMPLETION_RU)
    }

    pub fn task_request() -> Self {
        Self::new("task_request", TASK_REQUEST_EN, TASK_REQUEST_RU)
    }

    fn keywords_for(&self, text: &str) -> &[String] {
        match Language::detect(text) {
            Language::English => &self.latin,
            Language::Russian => &self.cyrillic,
        }
    }

    /// Keywords from the script-selected list that occur in `text`.
    pub fn matches(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.keywords_for(text)
            .iter()
            .filter(|keyword| lowered.contains(keyword.as_str()))
            .cloned()
            .collect()
    }
}

impl SignalDetector for KeywordDetector {
    fn name(&self) -> &str {
        self.name
    }

    fn detect(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords_for(text)
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }
}

/// Detector outcomes for one user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signals {
    pub emotion: bool,
    pub completion: bool,
    pub task_request: bool,
}

/// The three detectors the phase machine consults.
pub struct SignalSet {
    emotion: Box<dyn SignalDetector>,
    completion: Box<dyn SignalDetector>,
    task_request: Box<dyn SignalDetector>,
    emotion_words: KeywordDetector,
}

impl SignalSet {
    pub fn new(
        emotion: Box<dyn SignalDetector>,
        completion: Box<dyn SignalDetector>,
        task_request: Box<dyn SignalDetector>,
    ) -> Self {
        Self {
            emotion,
            completion,
            task_request,
            emotion_words: KeywordDetector::emotion(),
        }
    }

    pub fn detect(&self, text: &str) -> Signals {
        Signals {
            emotion: self.emotion.detect(text),
            completion: self.completion.detect(text),
            task_request: self.task_request.detect(text),
        }
    }

    /// Emotion keywords present in `text`, used to avoid repetitive mirroring.
    pub fn emotion_words(&self, text: &str) -> Vec<String> {
        self.emotion_words.matches(text)
    }

    pub fn detector_names(&self) -> [&str; 3] {
        [
            self.emotion.name(),
            self.completion.name(),
            self.task_request.name(),
        ]
    }
}

impl Default for SignalSet {
    fn default() -> Self {
        Self::new(
            Box::new(KeywordDetector::emotion()),
            Box::new(KeywordDetector::completion()),
            Box::new(KeywordDetector::task_request()),
        )
    }
}

impl std::fmt::Debug for SignalSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalSet")
            .field("detectors", &self.detector_names())
            .finish()
    }
}
