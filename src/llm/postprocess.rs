//! Response post-processing: blocklisted phrasing is swapped for grounded
//! alternatives, then the reply is trimmed to the word budget, preferring a
//! sentence boundary. Running it again on its own output is a no-op.

use crate::config::SanitizerConfig;
use crate::conversation::Language;
use crate::prompt::phrases;
use rand::Rng;
use rand::seq::IndexedRandom;
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_MAX_WORDS: usize = 80;

/// Substitution passes before any residue is stripped outright.
const MAX_SUBSTITUTION_PASSES: usize = 3;

const SENTENCE_ENDINGS: [char; 4] = ['.', '!', '?', '…'];
const CLOSING_MARKS: [char; 6] = ['"', '\'', '”', '’', '»', ')'];

static BLOCKLIST_EN: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_blocklist(phrases::blocklist(Language::English)));
static BLOCKLIST_RU: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_blocklist(phrases::blocklist(Language::Russian)));

fn compile_blocklist(phrases: &[&str]) -> Vec<Regex> {
    phrases
        .iter()
        .filter_map(|phrase| {
            // Accept typographic apostrophes wherever the phrase has a plain one.
            let pattern = regex::escape(phrase).replace('\'', "['’]");
            Regex::new(&format!("(?i){pattern}")).ok()
        })
        .collect()
}

fn blocklist_patterns(language: Language) -> &'static [Regex] {
    match language {
        Language::English => &BLOCKLIST_EN,
        Language::Russian => &BLOCKLIST_RU,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSanitizer {
    max_words: usize,
}

impl Default for ResponseSanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORDS)
    }
}

impl ResponseSanitizer {
    pub fn new(max_words: usize) -> Self {
        Self { max_words }
    }

    pub fn from_config(config: &SanitizerConfig) -> Self {
        Self::new(config.max_words)
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn process(&self, text: &str, language: Language) -> String {
        self.process_with_rng(text, language, &mut rand::rng())
    }

    pub fn process_with_rng<R: Rng + ?Sized>(
        &self,
        text: &str,
        language: Language,
        rng: &mut R,
    ) -> String {
        let substituted = substitute_blocklisted(text, language, rng);
        trim_to_word_budget(&substituted, self.max_words)
    }
}

/// Clean a generated reply with the default word budget.
pub fn post_process(text: &str, language: Language) -> String {
    ResponseSanitizer::default().process(text, language)
}

/// Replace every blocklisted phrase (case-insensitive) with a grounded
/// alternative.
pub fn substitute_blocklisted<R: Rng + ?Sized>(
    text: &str,
    language: Language,
    rng: &mut R,
) -> String {
    let patterns = blocklist_patterns(language);
    let alternatives = phrases::grounded_alternatives(language);
    let mut output = text.to_string();

    for _ in 0..MAX_SUBSTITUTION_PASSES {
        let mut changed = false;
        for pattern in patterns {
            if !pattern.is_match(&output) {
                continue;
            }
            changed = true;
            output = pattern
                .replace_all(&output, |_: &regex::Captures<'_>| {
                    alternatives.choose(&mut *rng).copied().unwrap_or_default().to_string()
                })
                .into_owned();
        }
        if !changed {
            return output;
        }
    }

    let residue: Vec<&Regex> = patterns.iter().filter(|p| p.is_match(&output)).collect();
    if !residue.is_empty() {
        tracing::warn!(
            patterns = residue.len(),
            "blocklisted phrasing survived substitution, stripping"
        );
        for pattern in residue {
            output = pattern.replace_all(&output, "").into_owned();
        }
    }
    output
}

/// Cut `text` to at most `max_words` whitespace-separated words.
///
/// When the text is over budget, the cut lands on the last sentence ending
/// within the budget if that keeps at least half of it; otherwise the text is
/// hard-cut after the last permitted word.
pub fn trim_to_word_budget(text: &str, max_words: usize) -> String {
    if max_words == 0 {
        return String::new();
    }

    let spans: Vec<(usize, usize)> = word_spans(text).take(max_words + 1).collect();
    if spans.len() <= max_words {
        return text.trim().to_string();
    }

    let kept = &spans[..max_words];
    let sentence_cut = kept
        .iter()
        .enumerate()
        .rev()
        .find(|(_, (start, end))| ends_sentence(&text[*start..*end]))
        .map(|(idx, (_, end))| (idx + 1, *end));

    let end = match sentence_cut {
        Some((words, end)) if words * 2 >= max_words => end,
        _ => kept[max_words - 1].1,
    };
    text[..end].trim().to_string()
}

fn ends_sentence(word: &str) -> bool {
    word.trim_end_matches(CLOSING_MARKS)
        .ends_with(SENTENCE_ENDINGS)
}

/// Byte ranges of whitespace-separated words.
fn word_spans(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut start: Option<usize> = None;
    text.char_indices()
        .chain(std::iter::once((text.len(), ' ')))
        .filter_map(move |(idx, ch)| {
            if ch.is_whitespace() {
                start.take().map(|s| (s, idx))
            } else {
                if start.is_none() {
                    start = Some(idx);
                }
                None
            }
        })
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
