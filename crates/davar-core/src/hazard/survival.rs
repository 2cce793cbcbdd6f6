// Survival of a player across the picks before the user's next turn.

use std::collections::HashMap;

use super::HazardMap;
use crate::draft::pick::PlayerId;

/// Probability that `id` is still available after every pick in `hazards`.
///
/// Picks are treated as independent: survival = Π (1 - h_k). Hazards are
/// clamped into [0, 1], so the result always lies in [0, 1]. An empty
/// horizon, or a player absent from every map, survives with probability 1.
pub fn survival_probability(hazards: &[HazardMap], id: PlayerId) -> f64 {
    hazards
        .iter()
        .map(|h| 1.0 - h.get(&id).copied().unwrap_or(0.0).clamp(0.0, 1.0))
        .product()
}

/// Survival probabilities for a set of players.
pub fn survival_map<I>(hazards: &[HazardMap], ids: I) -> HashMap<PlayerId, f64>
where
    I: IntoIterator<Item = PlayerId>,
{
    ids.into_iter()
        .map(|id| (id, survival_probability(hazards, id)))
        .collect()
}
