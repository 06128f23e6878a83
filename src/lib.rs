#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod app;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod session;

pub use config::Config;
pub use conversation::{
    ConversationState, Decision, MentorProfile, PhaseMachine, initialize_state,
    resolve_mentor_profile,
};
pub use error::{MentorError, Result};
pub use llm::post_process;
pub use prompt::compile_prompt;
