// Expected positional depletion over the horizon.

use std::collections::{BTreeMap, HashMap};

use super::HazardMap;
use crate::draft::pick::{PlayerId, Position};
use crate::projections::Player;

/// Expected number of players taken at each position before the user's next
/// turn. Positions no hazard touches are absent; read them as 0.
pub type PositionDrain = BTreeMap<Position, f64>;

/// Sum every hazard into its player's position.
///
/// This is a sum of Bernoulli expectations, not a probability, so a value
/// above 1.0 is normal. Hazards naming players missing from `players` are
/// ignored.
pub fn expected_position_drain(
    hazards: &[HazardMap],
    players: &HashMap<PlayerId, &Player>,
) -> PositionDrain {
    let mut drain = PositionDrain::new();
    for step in hazards {
        for (id, &h) in step {
            if let Some(p) = players.get(id) {
                *drain.entry(p.position).or_insert(0.0) += h.clamp(0.0, 1.0);
            }
        }
    }
    drain
}

/// Drain at `pos`, treating a missing key as 0.
pub fn drain_at(drain: &PositionDrain, pos: Position) -> f64 {
    drain.get(&pos).copied().unwrap_or(0.0)
}
