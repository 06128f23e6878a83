pub mod compiler;
pub mod phrases;

pub use compiler::{DEFAULT_HISTORY_WINDOW, PromptContext, compile_prompt};
