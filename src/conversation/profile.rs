use super::types::Action;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Sum tolerance for a normalized distribution.
pub const WEIGHT_EPSILON: f64 = 1e-9;

// MentorStyle: closed set of conversational characters
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MentorStyle {
    #[default]
    Gentle,
    Socratic,
    Coach,
    Witness,
}

// MentorTone: additive bias on top of a style
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MentorTone {
    Warm,
    Direct,
    Playful,
    Calm,
}

/// Probability mass per weighted action. Normalized instances sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionWeights {
    pub reflect: f64,
    pub ask_question: f64,
    pub validate: f64,
    pub micro_task: f64,
    pub silence: f64,
}

impl ActionWeights {
    pub const fn new(
        reflect: f64,
        ask_question: f64,
        validate: f64,
        micro_task: f64,
        silence: f64,
    ) -> Self {
        Self {
            reflect,
            ask_question,
            validate,
            micro_task,
            silence,
        }
    }

    /// Substituted whenever the inputs carry no usable mass.
    pub const FALLBACK: Self = Self::new(0.30, 0.25, 0.25, 0.10, 0.10);

    /// Entries in draw order.
    pub fn entries(&self) -> [(Action, f64); 5] {
        [
            (Action::Reflect, self.reflect),
            (Action::AskQuestion, self.ask_question),
            (Action::Validate, self.validate),
            (Action::MicroTask, self.micro_task),
            (Action::Silence, self.silence),
        ]
    }

    pub fn get(&self, action: Action) -> f64 {
        match action {
            Action::Reflect => self.reflect,
            Action::AskQuestion => self.ask_question,
            Action::Validate => self.validate,
            Action::MicroTask => self.micro_task,
            Action::Silence => self.silence,
        }
    }

    pub fn total(&self) -> f64 {
        self.entries().iter().map(|(_, weight)| weight).sum()
    }

    /// Clamp every dimension to `>= 0` (non-finite values count as 0) and
    /// rescale to sum to 1. All-zero input yields [`Self::FALLBACK`].
    pub fn normalized(&self) -> Self {
        let clamp = |weight: f64| if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        let clamped = Self::new(
            clamp(self.reflect),
            clamp(self.ask_question),
            clamp(self.validate),
            clamp(self.micro_task),
            clamp(self.silence),
        );

        let total = clamped.total();
        if total <= 0.0 || !total.is_finite() {
            tracing::warn!("action weights carry no mass, using fallback distribution");
            return Self::FALLBACK;
        }

        Self::new(
            clamped.reflect / total,
            clamped.ask_question / total,
            clamped.validate / total,
            clamped.micro_task / total,
            clamped.silence / total,
        )
    }

    fn shifted(&self, delta: &ToneDelta) -> Self {
        Self::new(
            self.reflect + delta.reflect,
            self.ask_question + delta.ask_question,
            self.validate + delta.validate,
            self.micro_task + delta.micro_task,
            self.silence + delta.silence,
        )
    }
}

/// Signed per-action adjustment a tone applies to a style's base weights.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToneDelta {
    pub reflect: f64,
    pub ask_question: f64,
    pub validate: f64,
    pub micro_task: f64,
    pub silence: f64,
}

impl MentorStyle {
    pub fn base_weights(self) -> ActionWeights {
        match self {
            Self::Gentle => ActionWeights::new(0.35, 0.20, 0.30, 0.05, 0.10),
            Self::Socratic => ActionWeights::new(0.20, 0.45, 0.15, 0.10, 0.10),
            Self::Coach => ActionWeights::new(0.15, 0.25, 0.15, 0.35, 0.10),
            Self::Witness => ActionWeights::new(0.35, 0.10, 0.25, 0.00, 0.30),
        }
    }

    /// Parse a configured style, falling back to the default on unknown input.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(style = raw, "unknown mentor style, using default");
            Self::default()
        })
    }
}

impl MentorTone {
    pub fn delta(self) -> ToneDelta {
        match self {
            Self::Warm => ToneDelta {
                validate: 0.10,
                silence: -0.05,
                ..ToneDelta::default()
            },
            Self::Direct => ToneDelta {
                ask_question: 0.10,
                validate: -0.10,
                micro_task: 0.05,
                ..ToneDelta::default()
            },
            Self::Playful => ToneDelta {
                micro_task: 0.10,
                silence: -0.10,
                ..ToneDelta::default()
            },
            Self::Calm => ToneDelta {
                silence: 0.10,
                ask_question: -0.10,
                ..ToneDelta::default()
            },
        }
    }

    /// Parse a configured tone. Unknown or blank input means no adjustment.
    pub fn parse_optional(raw: Option<&str>) -> Option<Self> {
        let raw = raw.map(str::trim).filter(|value| !value.is_empty())?;
        match raw.parse() {
            Ok(tone) => Some(tone),
            Err(_) => {
                tracing::warn!(tone = raw, "unknown mentor tone, ignoring");
                None
            }
        }
    }
}

/// Resolved conversational character: style plus its action distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MentorProfile {
    pub style: MentorStyle,
    pub tone: Option<MentorTone>,
    pub action_weights: ActionWeights,
}

impl MentorProfile {
    pub fn resolve(style: MentorStyle, tone: Option<MentorTone>) -> Self {
        Self::resolve_with_delta(style, tone, tone.map(MentorTone::delta))
    }

    /// Resolve with an explicit delta (tests and custom tone tables).
    pub fn resolve_with_delta(
        style: MentorStyle,
        tone: Option<MentorTone>,
        delta: Option<ToneDelta>,
    ) -> Self {
        let base = style.base_weights();
        let shifted = delta.map_or(base, |delta| base.shifted(&delta));
        Self {
            style,
            tone,
            action_weights: shifted.normalized(),
        }
    }
}

/// Resolve a profile from configuration strings.
pub fn resolve_mentor_profile(style: &str, tone: Option<&str>) -> MentorProfile {
    MentorProfile::resolve(
        MentorStyle::parse_or_default(style),
        MentorTone::parse_optional(tone),
    )
}
