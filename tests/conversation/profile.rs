use mentorflow::conversation::profile::WEIGHT_EPSILON;
use mentorflow::conversation::{
    Action, ActionWeights, MentorProfile, MentorStyle, MentorTone, ToneDelta,
    resolve_mentor_profile, select_action,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use strum::IntoEnumIterator;

fn assert_distribution(weights: &ActionWeights) {
    assert!((weights.total() - 1.0).abs() <= WEIGHT_EPSILON, "{weights:?}");
    for (action, weight) in weights.entries() {
        assert!(weight >= 0.0, "{action} is negative in {weights:?}");
    }
}

#[test]
fn every_style_and_tone_pair_is_a_distribution() {
    for style in MentorStyle::iter() {
        assert_distribution(&MentorProfile::resolve(style, None).action_weights);
        for tone in MentorTone::iter() {
            assert_distribution(&MentorProfile::resolve(style, Some(tone)).action_weights);
        }
    }
}

#[test]
fn string_resolution_falls_back_on_unknown_values() {
    let unknown = resolve_mentor_profile("drill-sergeant", Some("sarcastic"));
    assert_eq!(unknown.style, MentorStyle::Gentle);
    assert_eq!(unknown.tone, None);
    assert_eq!(unknown, MentorProfile::resolve(MentorStyle::Gentle, None));

    let parsed = resolve_mentor_profile(" Socratic ", Some("CALM"));
    assert_eq!(parsed.style, MentorStyle::Socratic);
    assert_eq!(parsed.tone, Some(MentorTone::Calm));
}

#[test]
fn adversarial_delta_is_clamped_before_normalizing() {
    let delta = ToneDelta {
        reflect: -5.0,
        ask_question: -5.0,
        validate: 0.5,
        micro_task: f64::NAN,
        silence: -5.0,
    };
    let profile = MentorProfile::resolve_with_delta(MentorStyle::Coach, None, Some(delta));
    assert_distribution(&profile.action_weights);
    assert!((profile.action_weights.validate - 1.0).abs() <= WEIGHT_EPSILON);
}

#[test]
fn delta_that_erases_everything_uses_fallback() {
    let delta = ToneDelta {
        reflect: -1.0,
        ask_question: -1.0,
        validate: -1.0,
        micro_task: -1.0,
        silence: -1.0,
    };
    let profile = MentorProfile::resolve_with_delta(MentorStyle::Witness, None, Some(delta));
    assert_eq!(profile.action_weights, ActionWeights::FALLBACK);
}

#[test]
fn selector_frequencies_follow_the_weights() {
    let weights = MentorProfile::resolve(MentorStyle::Socratic, None).action_weights;
    let mut rng = StdRng::seed_from_u64(2024);
    let draws = 20_000;
    let mut counts = [0usize; 5];
    for _ in 0..draws {
        let action = select_action(&weights, &mut rng);
        let idx = Action::iter().position(|a| a == action).unwrap_or(0);
        counts[idx] += 1;
    }

    for (idx, (_, expected)) in weights.entries().iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let observed = counts[idx] as f64 / f64::from(draws);
        assert!(
            (observed - expected).abs() < 0.02,
            "action {idx}: observed {observed}, expected {expected}"
        );
    }
}

#[test]
fn zero_weight_actions_are_never_drawn() {
    let weights = MentorProfile::resolve(MentorStyle::Witness, None).action_weights;
    assert!(weights.micro_task.abs() < WEIGHT_EPSILON);
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..5_000 {
        assert_ne!(select_action(&weights, &mut rng), Action::MicroTask);
    }
}
