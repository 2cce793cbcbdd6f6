// Replacement levels: the ppg of the first player past the starter tier.
//
// Each team starts `req` players at a position, and FLEX demand is split
// evenly over RB, WR, and TE. The player just past that league-wide demand
// is the replacement baseline for the position.

use std::collections::BTreeMap;
use std::ops::Index;

use serde::Serialize;
use tracing::warn;

use super::{position_lists, PositionValues};
use crate::draft::pick::Position;
use crate::draft::roster::LineupRequirements;
use crate::error::{DraftError, Result};
use crate::projections::Player;

// ---------------------------------------------------------------------------
// Replacement indices
// ---------------------------------------------------------------------------

/// 0-based replacement index per position for a league of `num_teams`.
///
/// `floor(n * req + n * flex / 3)` for RB/WR/TE and `floor(n * req)` for QB.
/// Truncation (floor) is the policy here: a fractional FLEX share never
/// promotes one more player into the starter tier.
pub fn replacement_indices(
    num_teams: usize,
    lineup: &LineupRequirements,
) -> BTreeMap<Position, usize> {
    let n = num_teams as f64;
    let flex_share = lineup.flex as f64 / 3.0;
    Position::ALL
        .iter()
        .map(|&pos| {
            let req = lineup.slots_for(pos) as f64;
            let demand = if pos.is_flex_eligible() {
                n * req + n * flex_share
            } else {
                n * req
            };
            (pos, demand.floor() as usize)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Replacement levels
// ---------------------------------------------------------------------------

/// Replacement ppg for every position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReplacementLevels(PositionValues);

impl ReplacementLevels {
    pub fn get(&self, pos: Position) -> f64 {
        self[pos]
    }

    pub fn as_values(&self) -> &PositionValues {
        &self.0
    }
}

impl Index<Position> for ReplacementLevels {
    type Output = f64;

    fn index(&self, pos: Position) -> &f64 {
        // construction guarantees all four positions
        &self.0[&pos]
    }
}

/// Replacement levels over `pool`.
///
/// Pass the full pool for static tiers or only the available players for
/// live recommendations. An index past the end of a position list clamps to
/// its last player; a position with no players fails with
/// `InsufficientPlayerPool`.
pub fn replacement_levels<'a, I>(
    pool: I,
    num_teams: usize,
    lineup: &LineupRequirements,
) -> Result<ReplacementLevels>
where
    I: IntoIterator<Item = &'a Player>,
{
    let lists = position_lists(pool);
    let indices = replacement_indices(num_teams, lineup);

    let mut levels = PositionValues::new();
    for pos in Position::ALL {
        let list = lists
            .get(&pos)
            .filter(|l| !l.is_empty())
            .ok_or(DraftError::InsufficientPlayerPool { position: pos })?;
        let idx = indices[&pos];
        let player = match list.get(idx) {
            Some(p) => p,
            None => {
                warn!(
                    "replacement index {} for {} exceeds {} available; using last",
                    idx,
                    pos,
                    list.len()
                );
                list[list.len() - 1]
            }
        };
        levels.insert(pos, player.ppg);
    }
    Ok(ReplacementLevels(levels))
}

/// Value over replacement: `ppg - replacement[pos]`. Not clamped; a player
/// below the baseline scores negative.
pub fn simple_var(ppg: f64, pos: Position, replacement: &PositionValues) -> Result<f64> {
    let repl = replacement
        .get(&pos)
        .copied()
        .ok_or(DraftError::MissingPositionValue {
            position: pos,
            table: "replacement",
        })?;
    Ok(ppg - repl)
}

/// Position-tag variant of [`simple_var`] for callers holding raw tags.
pub fn simple_var_for_tag(ppg: f64, pos: &str, replacement: &PositionValues) -> Result<f64> {
    let pos: Position = pos.parse()?;
    simple_var(ppg, pos, replacement)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
