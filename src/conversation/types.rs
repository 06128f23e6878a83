use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// Phase: ordered stage of a single day's conversation
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    #[default]
    Intro,
    Reflection,
    Task,
    Integration,
}

impl Phase {
    /// The phase that follows this one, `None` for integration.
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Intro => Some(Self::Reflection),
            Self::Reflection => Some(Self::Task),
            Self::Task => Some(Self::Integration),
            Self::Integration => None,
        }
    }
}

// Action: one of the five weighted conversational moves
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Reflect,
    AskQuestion,
    Validate,
    MicroTask,
    Silence,
}

// DirectiveAction: what the generator is told to do this turn
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DirectiveAction {
    Reflect,
    AskQuestion,
    Validate,
    MicroTask,
    Silence,
    GiveTask,
    Summarize,
    CloseDay,
}

impl From<Action> for DirectiveAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Reflect => Self::Reflect,
            Action::AskQuestion => Self::AskQuestion,
            Action::Validate => Self::Validate,
            Action::MicroTask => Self::MicroTask,
            Action::Silence => Self::Silence,
        }
    }
}

/// Day content the conversation is anchored to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DayPlan {
    pub task: String,
    pub goal: String,
}

impl DayPlan {
    pub fn new(task: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            goal: goal.into(),
        }
    }
}

/// Per (participant, day) conversation record.
///
/// Mutated exactly once per successful turn; the caller persists it between
/// turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub phase: Phase,
    pub message_count_in_phase: u32,
    pub total_message_count: u32,
    pub questions_asked_in_phase: u32,
    pub user_shared_emotion: bool,
    pub user_indicated_completion: bool,
    #[serde(default)]
    pub day_complete: bool,
    pub task: String,
    pub goal: String,
}

impl ConversationState {
    pub fn new(plan: &DayPlan) -> Self {
        Self {
            phase: Phase::Intro,
            message_count_in_phase: 0,
            total_message_count: 0,
            questions_asked_in_phase: 0,
            user_shared_emotion: false,
            user_indicated_completion: false,
            day_complete: false,
            task: plan.task.clone(),
            goal: plan.goal.clone(),
        }
    }
}

/// Create the opening state for a day.
pub fn initialize_state(task: &str, goal: &str) -> ConversationState {
    ConversationState::new(&DayPlan::new(task, goal))
}

/// Auxiliary instructions carried alongside a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DecisionContext {
    #[serde(default)]
    pub focus_point: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub completes_day: bool,
}

/// Single-turn verdict of the phase state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: DirectiveAction,
    pub phase: Phase,
    pub next_phase: Option<Phase>,
    pub context: DecisionContext,
    pub reason: String,
}

impl Decision {
    /// Build a decision. `completes_day` is derived from the phase so that it
    /// holds if and only if the decision was made in integration.
    pub fn new(
        action: DirectiveAction,
        phase: Phase,
        next_phase: Option<Phase>,
        mut context: DecisionContext,
        reason: impl Into<String>,
    ) -> Self {
        context.completes_day = phase == Phase::Integration;
        Self {
            action,
            phase,
            next_phase,
            context,
            reason: reason.into(),
        }
    }

    /// Safe no-op: validate without changing phase.
    pub fn fallback(phase: Phase, reason: impl Into<String>) -> Self {
        Self::new(
            DirectiveAction::Validate,
            phase,
            None,
            DecisionContext::default(),
            reason,
        )
    }

    pub fn completes_day(&self) -> bool {
        self.context.completes_day
    }

    pub fn with_focus_point(mut self, focus_point: impl Into<String>) -> Self {
        self.context.focus_point = Some(focus_point.into());
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.context.instruction = Some(instruction.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.context.content = Some(content.into());
        self
    }
}
