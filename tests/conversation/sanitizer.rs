use mentorflow::conversation::Language;
use mentorflow::llm::postprocess::word_count;
use mentorflow::llm::{ResponseSanitizer, post_process, trim_to_word_budget};
use mentorflow::prompt::phrases::blocklist;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn has_blocklisted(text: &str, language: Language) -> bool {
    let lowered = text.to_lowercase().replace('’', "'");
    blocklist(language)
        .iter()
        .any(|phrase| lowered.contains(&phrase.to_lowercase()))
}

#[test]
fn output_never_contains_blocklisted_phrases() {
    let sanitizer = ResponseSanitizer::new(200);
    let mut rng = StdRng::seed_from_u64(1);
    for language in [Language::English, Language::Russian] {
        for phrase in blocklist(language) {
            let shouting = phrase.to_uppercase();
            let text = format!("{phrase}. {shouting}! Again: {phrase}, {phrase}.");
            let out = sanitizer.process_with_rng(&text, language, &mut rng);
            assert!(!has_blocklisted(&out, language), "{phrase}: {out}");
        }
    }
}

#[test]
fn word_budget_is_respected() {
    let text = "This is a sentence that goes on. ".repeat(40);
    for max_words in [1, 5, 17, 80] {
        let out = trim_to_word_budget(&text, max_words);
        assert!(word_count(&out) <= max_words, "{max_words}: {out}");
    }
}

#[test]
fn trimmed_output_ends_on_boundary_within_last_half() {
    let text = "First point is here. Second point follows right after it. Third keeps going and \
                going without stopping for a long while yet";
    let out = trim_to_word_budget(text, 14);
    assert_eq!(out, "First point is here. Second point follows right after it.");
}

#[test]
fn hard_cut_when_only_boundary_is_too_early() {
    let text = "Yes. and then a long run of words with no punctuation anywhere in sight";
    let out = trim_to_word_budget(text, 8);
    assert_eq!(out, "Yes. and then a long run of words");
}

#[test]
fn post_process_is_idempotent() {
    let repeated = "Short sentence here. ".repeat(50);
    let inputs: [&str; 4] = [
        "I understand how you feel. Let's look at one small thing you noticed today.",
        repeated.as_str(),
        "Я тебя слышу. Давай посмотрим на одну мелочь.",
        "",
    ];
    for input in inputs {
        let language = Language::detect(input);
        let once = post_process(input, language);
        assert_eq!(post_process(&once, language), once);
    }
}

#[test]
fn compliant_text_passes_through() {
    let text = "Three small things today: coffee, a call, the walk home.";
    assert_eq!(post_process(text, Language::English), text);
}
