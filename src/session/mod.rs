pub mod store;
pub mod turn;

pub use store::{
    InMemoryStateStore, JsonFileStateStore, SessionKey, StateStore, sanitize_participant_id,
};
pub use turn::{TurnEngine, TurnOutcome, TurnRequest};
