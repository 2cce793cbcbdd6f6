// Valuation engine: replacement levels, expected-best estimation, DAVAR scores.

pub mod davar;
pub mod replacement;
pub mod scarcity;

use std::collections::BTreeMap;

use crate::draft::pick::Position;
use crate::projections::{by_ppg_desc, Player};

/// A ppg figure per position (bestNow, expectedBest, replacement...).
pub type PositionValues = BTreeMap<Position, f64>;

/// Players grouped by position, each list sorted by descending ppg.
/// Positions with no players are absent.
pub fn position_lists<'a, I>(players: I) -> BTreeMap<Position, Vec<&'a Player>>
where
    I: IntoIterator<Item = &'a Player>,
{
    let mut lists: BTreeMap<Position, Vec<&'a Player>> = BTreeMap::new();
    for p in players {
        lists.entry(p.position).or_default().push(p);
    }
    for list in lists.values_mut() {
        list.sort_by(|a, b| by_ppg_desc(a, b));
    }
    lists
}
