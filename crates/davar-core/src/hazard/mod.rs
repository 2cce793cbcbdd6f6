// Opponent pick hazards: survival to the user's next turn, positional
// drain over the horizon, and the default board-attention model that
// produces hazards when the caller does not supply them.

pub mod board;
pub mod drain;
pub mod survival;

use std::collections::HashMap;

use crate::draft::pick::PlayerId;

/// Probability that one upcoming pick takes each player. Absent players
/// have zero hazard at that pick.
pub type HazardMap = HashMap<PlayerId, f64>;
