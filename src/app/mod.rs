pub mod dispatch;
pub mod simulate;

pub use dispatch::dispatch;
pub use simulate::{SimulatedTurn, run_simulation};
