// Positional scarcity: best available now, expected best after the horizon,
// and the opportunity cost of waiting at each position.

use std::collections::{BTreeMap, HashMap};

use super::PositionValues;
use crate::draft::pick::{PlayerId, Position};
use crate::hazard::drain::{drain_at, PositionDrain};
use crate::projections::Player;

/// Per-position lists of available players, best ppg first.
pub type PositionLists<'a> = BTreeMap<Position, Vec<&'a Player>>;

/// Best available ppg per position. Positions with nobody left are absent.
pub fn best_now(lists: &PositionLists<'_>) -> PositionValues {
    lists
        .iter()
        .filter_map(|(&pos, list)| list.first().map(|p| (pos, p.ppg)))
        .collect()
}

// ---------------------------------------------------------------------------
// Expected best after the horizon
// ---------------------------------------------------------------------------

/// What an estimator may look at.
pub struct ScarcityInputs<'a> {
    pub lists: &'a PositionLists<'a>,
    pub drain: &'a PositionDrain,
    /// Survival per player; a missing id counts as certain to survive.
    pub survival: &'a HashMap<PlayerId, f64>,
}

/// Estimates the best ppg still available at each position once the horizon
/// has elapsed.
///
/// Implementations must return exactly `best_now` for every non-empty
/// position when no player is at risk (all survival 1, all drain 0).
pub trait ExpectedBestEstimator: Send + Sync {
    fn expected_best(&self, inputs: &ScarcityInputs<'_>) -> PositionValues;
}

/// Walk `floor(drain)` places down each position's list.
///
/// A shift past the end of the list lands on the last player. Positions
/// with no available players get `floor_ppg`.
#[derive(Debug, Clone)]
pub struct DrainShiftEstimator {
    pub floor_ppg: f64,
}

impl ExpectedBestEstimator for DrainShiftEstimator {
    fn expected_best(&self, inputs: &ScarcityInputs<'_>) -> PositionValues {
        Position::ALL
            .iter()
            .map(|&pos| {
                let value = match inputs.lists.get(&pos).filter(|l| !l.is_empty()) {
                    None => self.floor_ppg,
                    Some(list) => {
                        // expected count, truncated: a partial drain does not
                        // remove a whole player
                        let shift = drain_at(inputs.drain, pos).max(0.0).floor() as usize;
                        list[shift.min(list.len() - 1)].ppg
                    }
                };
                (pos, value)
            })
            .collect()
    }
}

/// Expectation of the best survivor, treating survivals as independent.
///
/// `E = Σ ppg_i · s_i · Π_{j<i} (1 - s_j)` down the sorted list; the mass left
/// when every listed player is gone goes to the last player. Positions with
/// no available players get `floor_ppg`.
#[derive(Debug, Clone)]
pub struct SurvivalWeightedEstimator {
    pub floor_ppg: f64,
}

impl ExpectedBestEstimator for SurvivalWeightedEstimator {
    fn expected_best(&self, inputs: &ScarcityInputs<'_>) -> PositionValues {
        Position::ALL
            .iter()
            .map(|&pos| {
                let value = match inputs.lists.get(&pos).and_then(|l| l.last().map(|last| (l, last))) {
                    None => self.floor_ppg,
                    Some((list, last)) => {
                        let mut gone = 1.0;
                        let mut expected = 0.0;
                        for p in list {
                            let s = inputs
                                .survival
                                .get(&p.id)
                                .copied()
                                .unwrap_or(1.0)
                                .clamp(0.0, 1.0);
                            expected += p.ppg * s * gone;
                            gone *= 1.0 - s;
                        }
                        expected + gone * last.ppg
                    }
                };
                (pos, value)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Opportunity cost
// ---------------------------------------------------------------------------

/// Expected loss at `pos` from waiting: `max(0, bestNow - expectedBest)`.
/// A position missing from either table costs nothing.
pub fn opportunity_cost(pos: Position, best_now: &PositionValues, expected: &PositionValues) -> f64 {
    match (best_now.get(&pos), expected.get(&pos)) {
        (Some(now), Some(next)) => (now - next).max(0.0),
        _ => 0.0,
    }
}

pub fn opportunity_costs(best_now: &PositionValues, expected: &PositionValues) -> PositionValues {
    Position::ALL
        .iter()
        .map(|&pos| (pos, opportunity_cost(pos, best_now, expected)))
        .collect()
}
