pub mod machine;
pub mod profile;
pub mod selector;
pub mod signals;
pub mod types;

pub use machine::PhaseMachine;
pub use profile::{
    ActionWeights, MentorProfile, MentorStyle, MentorTone, ToneDelta, resolve_mentor_profile,
};
pub use selector::select_action;
pub use signals::{KeywordDetector, Language, SignalDetector, SignalSet, Signals};
pub use types::{
    Action, ConversationState, DayPlan, Decision, DecisionContext, DirectiveAction, Phase,
    initialize_state,
};
