use super::profile::ActionWeights;
use super::types::Action;
use rand::Rng;

/// Returned when the draw falls outside every cumulative range.
pub const FALLBACK_ACTION: Action = Action::Validate;

/// Cumulative-weight draw over `weights`.
///
/// The random source is injected so callers can pass a seeded generator.
pub fn select_action<R: Rng + ?Sized>(weights: &ActionWeights, rng: &mut R) -> Action {
    let total = weights.total();
    if total <= 0.0 || !total.is_finite() {
        return FALLBACK_ACTION;
    }

    let mut draw = rng.random::<f64>() * total;
    for (action, weight) in weights.entries() {
        if weight <= 0.0 {
            continue;
        }
        if draw < weight {
            return action;
        }
        draw -= weight;
    }

    FALLBACK_ACTION
}
