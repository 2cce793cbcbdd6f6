// DAVAR: draft-aware value above replacement.
//
//   base       = ppg - replacement[X]
//   delta_pos  = (1 - survival) * max(0, ppg - expectedBest[X])
//   hedge_loss = max over pos != X of max(0, bestNow[pos] - expectedBest[pos])
//   score      = base + alpha * delta_pos - beta * hedge_loss

use serde::{Deserialize, Serialize};

use super::scarcity::opportunity_cost;
use super::PositionValues;
use crate::draft::pick::Position;
use crate::error::{DraftError, Result};

/// Scoring policy weights. Both must be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DavarWeights {
    /// Weight on the cost of waiting at the candidate's own position.
    pub alpha: f64,
    /// Weight on the largest cross-position hedge loss.
    pub beta: f64,
}

impl Default for DavarWeights {
    fn default() -> Self {
        DavarWeights {
            alpha: 0.9,
            beta: 0.6,
        }
    }
}

/// Per-position tables shared by every candidate in one ranking pass.
#[derive(Debug, Clone, Copy)]
pub struct ScoringTables<'a> {
    pub best_now: &'a PositionValues,
    pub expected_best: &'a PositionValues,
    pub replacement: &'a PositionValues,
}

/// A DAVAR score with its components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DavarBreakdown {
    pub base: f64,
    pub delta_pos: f64,
    pub hedge_loss: f64,
    pub score: f64,
}

fn required(table: &PositionValues, pos: Position, name: &'static str) -> Result<f64> {
    table.get(&pos).copied().ok_or(DraftError::MissingPositionValue {
        position: pos,
        table: name,
    })
}

/// Score one candidate at position `pos`.
///
/// The candidate's own position must be present in all three tables. Other
/// positions missing from `best_now` or `expected_best` simply do not compete
/// in the hedge.
pub fn davar_score(
    ppg: f64,
    pos: Position,
    survival: f64,
    tables: &ScoringTables<'_>,
    weights: DavarWeights,
) -> Result<DavarBreakdown> {
    if !(0.0..=1.0).contains(&survival) {
        return Err(DraftError::validation(
            "survival",
            format!("must be a probability, got {survival}"),
        ));
    }
    if !(weights.alpha >= 0.0 && weights.beta >= 0.0) {
        return Err(DraftError::validation(
            "weights",
            format!(
                "alpha and beta must be >= 0, got {} and {}",
                weights.alpha, weights.beta
            ),
        ));
    }

    let replacement = required(tables.replacement, pos, "replacement")?;
    required(tables.best_now, pos, "bestNow")?;
    let expected_best = required(tables.expected_best, pos, "expectedBest")?;

    let base = ppg - replacement;
    let delta_pos = (1.0 - survival) * (ppg - expected_best).max(0.0);
    let hedge_loss = Position::ALL
        .iter()
        .filter(|&&other| {
            other != pos
                && tables.best_now.contains_key(&other)
                && tables.expected_best.contains_key(&other)
        })
        .map(|&other| opportunity_cost(other, tables.best_now, tables.expected_best))
        .fold(0.0, f64::max);

    Ok(DavarBreakdown {
        base,
        delta_pos,
        hedge_loss,
        score: base + weights.alpha * delta_pos - weights.beta * hedge_loss,
    })
}

/// [`davar_score`] for a raw position tag; unknown tags fail with
/// `InvalidPosition`.
pub fn davar_score_for_tag(
    ppg: f64,
    pos: &str,
    survival: f64,
    tables: &ScoringTables<'_>,
    weights: DavarWeights,
) -> Result<DavarBreakdown> {
    davar_score(ppg, pos.parse()?, survival, tables, weights)
}
