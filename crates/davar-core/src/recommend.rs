// Recommendation ranker: turns a draft snapshot and opponent hazards into an
// ordered list of picks for the user's next turn.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Serialize;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::draft::pick::{PlayerId, Position};
use crate::draft::state::DraftState;
use crate::error::{DraftError, Result};
use crate::hazard::board::{board_ordinals, most_likely, HazardModel};
use crate::hazard::drain::{expected_position_drain, PositionDrain};
use crate::hazard::survival::survival_map;
use crate::hazard::HazardMap;
use crate::projections::{by_ppg_desc, Player};
use crate::valuation::davar::{davar_score, DavarWeights, ScoringTables};
use crate::valuation::replacement::{replacement_levels, ReplacementLevels};
use crate::valuation::scarcity::{
    best_now, opportunity_cost, DrainShiftEstimator, ExpectedBestEstimator, ScarcityInputs,
};
use crate::valuation::{position_lists, PositionValues};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    pub ppg: f64,
    pub score: f64,
    /// Value over the live replacement level.
    pub var: f64,
    /// Probability the player is still there at the user's next turn.
    pub survival: f64,
    pub opportunity_cost: f64,
    /// 1-based place on the draft board among available players.
    pub board_ordinal: Option<u32>,
    pub adp_tag: String,
}

/// The single pick the opponent model considers most likely next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedPick {
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub available_count: usize,
    pub candidate_count: usize,
    pub best_now: PositionValues,
    pub expected_best: PositionValues,
    pub replacement: ReplacementLevels,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub recommendations: Vec<Recommendation>,
    /// Opponent picks before the user's next turn.
    pub horizon: u32,
    pub position_drain: PositionDrain,
    pub predicted_pick: Option<PredictedPick>,
    pub diagnostics: Diagnostics,
}

impl RecommendationResult {
    pub fn top(&self) -> Option<&Recommendation> {
        self.recommendations.first()
    }
}

// ---------------------------------------------------------------------------
// Ranker
// ---------------------------------------------------------------------------

pub struct Ranker {
    pub scoring: ScoringConfig,
    estimator: Box<dyn ExpectedBestEstimator>,
}

impl Ranker {
    /// A ranker using the drain-shift expected-best estimator.
    pub fn new(scoring: ScoringConfig) -> Self {
        let floor_ppg = scoring.expected_best_floor_ppg;
        Ranker {
            scoring,
            estimator: Box::new(DrainShiftEstimator { floor_ppg }),
        }
    }

    pub fn with_estimator(mut self, estimator: Box<dyn ExpectedBestEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    fn weights(&self) -> DavarWeights {
        DavarWeights {
            alpha: self.scoring.alpha,
            beta: self.scoring.beta,
        }
    }

    /// Rank available players with hazards produced by `model` over the
    /// horizon to the user's next pick.
    pub fn recommend_with_model(
        &self,
        state: &DraftState,
        pool: &[Player],
        model: &dyn HazardModel,
    ) -> Result<RecommendationResult> {
        let horizon = state.steps_until_user_next_pick();
        let available = state.available(pool);
        let hazards = model.horizon_hazards(state, &available, horizon);
        self.recommend(state, pool, &hazards, horizon)
    }

    /// Rank available players given caller-supplied hazards, one map per
    /// pick in the horizon.
    pub fn recommend(
        &self,
        state: &DraftState,
        pool: &[Player],
        hazards: &[HazardMap],
        horizon: u32,
    ) -> Result<RecommendationResult> {
        if hazards.len() != horizon as usize {
            return Err(DraftError::validation(
                "hazards",
                format!("expected {horizon} hazard maps, got {}", hazards.len()),
            ));
        }
        check_hazard_values(hazards)?;

        let available = state.available(pool);
        let by_id = index_by_id_refs(&available);
        let lists = position_lists(available.iter().copied());

        let replacement =
            replacement_levels(available.iter().copied(), state.team_count, &state.lineup)?;
        let best = best_now(&lists);
        let drain = expected_position_drain(hazards, &by_id);
        let survival = survival_map(hazards, available.iter().map(|p| p.id));
        let expected = self.estimator.expected_best(&ScarcityInputs {
            lists: &lists,
            drain: &drain,
            survival: &survival,
        });

        let mut candidates: Vec<&Player> = available.clone();
        candidates.sort_by(|a, b| by_ppg_desc(a, b));
        candidates.truncate(self.scoring.candidate_pool_size);
        debug!(
            "ranking {} candidates of {} available, horizon {}",
            candidates.len(),
            available.len(),
            horizon
        );

        let tables = ScoringTables {
            best_now: &best,
            expected_best: &expected,
            replacement: replacement.as_values(),
        };
        let ordinals = board_ordinals(&available);
        let current_pick = state.current_pick();

        let mut recommendations = candidates
            .iter()
            .map(|p| {
                let s = survival.get(&p.id).copied().unwrap_or(1.0);
                let davar = davar_score(p.ppg, p.position, s, &tables, self.weights())?;
                Ok(Recommendation {
                    player_id: p.id,
                    name: p.name.clone(),
                    position: p.position,
                    ppg: p.ppg,
                    score: davar.score,
                    var: davar.base,
                    survival: s,
                    opportunity_cost: opportunity_cost(p.position, &best, &expected),
                    board_ordinal: ordinals.get(&p.id).copied(),
                    adp_tag: adp_value_tag(p.adp, current_pick),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        recommendations.sort_by(rank_order);
        recommendations.truncate(self.scoring.top_n);

        let predicted_pick = hazards.first().and_then(most_likely).and_then(|(id, prob)| {
            by_id.get(&id).map(|p| PredictedPick {
                player_id: id,
                name: p.name.clone(),
                position: p.position,
                probability: prob,
            })
        });

        Ok(RecommendationResult {
            recommendations,
            horizon,
            position_drain: drain,
            predicted_pick,
            diagnostics: Diagnostics {
                available_count: available.len(),
                candidate_count: candidates.len(),
                best_now: best,
                expected_best: expected,
                replacement,
            },
        })
    }
}

/// Every hazard must be a probability. NaN fails the range check too.
fn check_hazard_values(hazards: &[HazardMap]) -> Result<()> {
    for (step, map) in hazards.iter().enumerate() {
        if let Some((id, h)) = map.iter().find(|(_, h)| !(0.0..=1.0).contains(*h)) {
            return Err(DraftError::validation(
                "hazards",
                format!(
                    "step {} gives player {id} hazard {h}, expected a value in [0, 1]",
                    step + 1
                ),
            ));
        }
    }
    Ok(())
}

fn index_by_id_refs<'a>(players: &[&'a Player]) -> HashMap<PlayerId, &'a Player> {
    players.iter().map(|p| (p.id, *p)).collect()
}

/// Higher score first, then higher ppg, then name.
fn rank_order(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.ppg.total_cmp(&a.ppg))
        .then_with(|| a.name.cmp(&b.name))
}

/// How a player's ADP compares with the pick being made.
///
/// `d = round(pick - adp)`, halves rounding up: positive is "value +d",
/// negative is "reach |d|", zero is "at ADP". No ADP gives "N/A".
pub fn adp_value_tag(adp: Option<f64>, pick: u32) -> String {
    let Some(adp) = adp.filter(|a| a.is_finite()) else {
        return "N/A".to_string();
    };
    let diff = (pick as f64 - adp + 0.5).floor() as i64;
    match diff.cmp(&0) {
        Ordering::Greater => format!("value +{diff}"),
        Ordering::Less => format!("reach {}", -diff),
        Ordering::Equal => "at ADP".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Human-readable recommendation table.
pub fn format_summary(result: &RecommendationResult, state: &DraftState) -> String {
    let mut out = String::new();
    let total_drain: f64 = result.position_drain.values().sum();
    let _ = writeln!(out, "Pick {} of {}", state.current_pick(), state.total_picks());
    let _ = writeln!(out, "Opponent picks before your next turn: {}", result.horizon);
    let _ = writeln!(out, "Expected players drained: {total_drain:.2}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<24} {:<4} {:>5} {:>6} {:>8} {:<10} {:>7} {:>7}",
        "Player", "Pos", "Board", "PPG", "Survive", "ADP", "OppCost", "DAVAR"
    );
    let _ = writeln!(out, "{}", "-".repeat(80));
    for rec in &result.recommendations {
        let board = rec
            .board_ordinal
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".into());
        let _ = writeln!(
            out,
            "{:<24} {:<4} {:>5} {:>6.2} {:>7.0}% {:<10} {:>7.2} {:>7.2}",
            truncate_name(&rec.name, 24),
            rec.position,
            board,
            rec.ppg,
            rec.survival * 100.0,
            rec.adp_tag,
            rec.opportunity_cost,
            rec.score
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Position drain by your next pick:");
    for pos in Position::ALL {
        if let Some(d) = result.position_drain.get(&pos) {
            let _ = writeln!(out, "  {pos}: {d:.2}");
        }
    }

    if let Some(pred) = &result.predicted_pick {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Most likely next opponent pick: {} ({}) p={:.0}%",
            pred.name,
            pred.position,
            pred.probability * 100.0
        );
    }

    if let Some(top) = result.top() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Top pick for your next turn: {} ({}) DAVAR {:.2}, survive {:.0}%",
            top.name,
            top.position,
            top.score,
            top.survival * 100.0
        );
    }
    out
}

fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let mut s: String = name.chars().take(max - 1).collect();
        s.push('~');
        s
    }
}

/// Players that match `query` by case-insensitive substring, best ppg first.
pub fn find_players<'a>(pool: &'a [Player], query: &str) -> Vec<&'a Player> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let mut found: Vec<&Player> = pool
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .collect();
    found.sort_by(|a, b| by_ppg_desc(a, b));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use crate::draft::roster::STANDARD_LINEUP;
    use crate::hazard::board::BoardAttentionModel;
    use crate::valuation::scarcity::SurvivalWeightedEstimator;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// Two teams, two of each position, distinct ppg.
    fn small_pool() -> Vec<Player> {
        let rows = [
            (1, "Qb Alpha", "QB", 22.0, 5.0),
            (2, "Qb Beta", "QB", 18.0, 15.0),
            (3, "Rb Alpha", "RB", 19.0, 1.0),
            (4, "Rb Beta", "RB", 14.0, 6.0),
            (5, "Rb Gamma", "RB", 9.0, 12.0),
            (6, "Wr Alpha", "WR", 17.0, 2.0),
            (7, "Wr Beta", "WR", 13.0, 7.0),
            (8, "Wr Gamma", "WR", 8.0, 11.0),
            (9, "Te Alpha", "TE", 11.0, 9.0),
            (10, "Te Beta", "TE", 7.0, 14.0),
        ];
        rows.iter()
            .map(|&(id, name, pos, ppg, adp)| {
                Player::new(PlayerId(id), name, pos, ppg)
                    .unwrap()
                    .with_adp(adp)
                    .unwrap()
            })
            .collect()
    }

    fn ranker() -> Ranker {
        Ranker::new(ScoringConfig::default())
    }

    #[test]
    fn empty_horizon_ranks_by_var_minus_hedge() {
        let pool = small_pool();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        // user on the clock at pick 1; pick 2 and 3 belong to team 1 -> H = 2
        let hazards = vec![HazardMap::new(), HazardMap::new()];
        let result = ranker().recommend(&state, &pool, &hazards, 2).unwrap();

        assert_eq!(result.horizon, 2);
        assert!(result.position_drain.is_empty());
        assert!(result.predicted_pick.is_none());
        assert_eq!(result.diagnostics.available_count, 10);
        assert_eq!(result.diagnostics.best_now, result.diagnostics.expected_best);
        for rec in &result.recommendations {
            assert_eq!(rec.survival, 1.0);
            assert!(approx_eq(rec.score, rec.var, 1e-12));
        }
        let scores: Vec<f64> = result.recommendations.iter().map(|r| r.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn hazard_count_must_match_horizon() {
        let pool = small_pool();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        let err = ranker().recommend(&state, &pool, &[], 2).unwrap_err();
        assert!(matches!(err, DraftError::Validation { .. }));
    }

    #[test]
    fn hazards_outside_unit_interval_rejected() {
        let pool = small_pool();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        for bad in [f64::NAN, 1.5, -0.1] {
            let hazards = vec![
                HazardMap::from([(PlayerId(3), 0.4)]),
                HazardMap::from([(PlayerId(6), bad)]),
            ];
            match ranker().recommend(&state, &pool, &hazards, 2).unwrap_err() {
                DraftError::Validation { field, message } => {
                    assert_eq!(field, "hazards");
                    assert!(message.contains("step 2"), "{message}");
                    assert!(message.contains(&PlayerId(6).to_string()), "{message}");
                }
                other => panic!("expected Validation, got {other:?}"),
            }
        }
    }

    #[test]
    fn certain_hazard_is_accepted() {
        let pool = small_pool();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        let hazards = vec![
            HazardMap::from([(PlayerId(9), 1.0)]),
            HazardMap::from([(PlayerId(9), 0.0)]),
        ];
        let result = ranker().recommend(&state, &pool, &hazards, 2).unwrap();
        let te = result
            .recommendations
            .iter()
            .find(|r| r.player_id == PlayerId(9))
            .unwrap();
        assert_eq!(te.survival, 0.0);
    }

    #[test]
    fn threatened_player_gains_urgency() {
        let pool = small_pool();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        let calm = vec![HazardMap::new(), HazardMap::new()];
        let threat: Vec<HazardMap> = vec![
            [(PlayerId(6), 0.9)].into_iter().collect(),
            [(PlayerId(6), 0.9)].into_iter().collect(),
        ];
        let r = ranker();
        let calm_wr = r.recommend(&state, &pool, &calm, 2).unwrap();
        let hot_wr = r.recommend(&state, &pool, &threat, 2).unwrap();
        let find = |res: &RecommendationResult| {
            res.recommendations
                .iter()
                .find(|x| x.player_id == PlayerId(6))
                .cloned()
                .unwrap()
        };
        let before = find(&calm_wr);
        let after = find(&hot_wr);
        assert!(approx_eq(after.survival, 0.01, 1e-9));
        assert!(after.score > before.score);
        assert_eq!(hot_wr.predicted_pick.as_ref().unwrap().player_id, PlayerId(6));
        assert!(approx_eq(hot_wr.position_drain[&Position::WR], 1.8, 1e-12));
    }

    #[test]
    fn top_n_and_candidate_pool_limits() {
        let pool = small_pool();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        let r = Ranker::new(ScoringConfig {
            top_n: 3,
            candidate_pool_size: 5,
            ..ScoringConfig::default()
        });
        let hazards = vec![HazardMap::new(), HazardMap::new()];
        let result = r.recommend(&state, &pool, &hazards, 2).unwrap();
        assert_eq!(result.recommendations.len(), 3);
        assert_eq!(result.diagnostics.candidate_count, 5);
        // the five best by ppg are QB 22, RB 19, QB 18, WR 17, RB 14
        for rec in &result.recommendations {
            assert!(rec.ppg >= 14.0);
        }
    }

    #[test]
    fn drafted_players_are_excluded() {
        let pool = small_pool();
        let mut state = DraftState::new(2, 5, 1, STANDARD_LINEUP).unwrap();
        state.draft_player(&pool[2]).unwrap();
        let hazards = vec![];
        let result = ranker().recommend(&state, &pool, &hazards, 0).unwrap();
        assert!(result
            .recommendations
            .iter()
            .all(|r| r.player_id != PlayerId(3)));
        assert_eq!(result.diagnostics.available_count, 9);
    }

    #[test]
    fn empty_position_fails_whole_request() {
        let pool: Vec<Player> = small_pool().into_iter().filter(|p| p.position != Position::TE).collect();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        let hazards = vec![HazardMap::new(), HazardMap::new()];
        let err = ranker().recommend(&state, &pool, &hazards, 2).unwrap_err();
        assert_eq!(
            err,
            DraftError::InsufficientPlayerPool {
                position: Position::TE
            }
        );
    }

    #[test]
    fn ties_break_by_ppg_then_name() {
        let mk = |score: f64, ppg: f64, name: &str| Recommendation {
            player_id: PlayerId(0),
            name: name.into(),
            position: Position::RB,
            ppg,
            score,
            var: score,
            survival: 1.0,
            opportunity_cost: 0.0,
            board_ordinal: None,
            adp_tag: "N/A".into(),
        };
        let mut recs = vec![
            mk(5.0, 10.0, "Zed"),
            mk(5.0, 10.0, "Amy"),
            mk(5.0, 12.0, "Bob"),
            mk(6.0, 1.0, "Top"),
        ];
        recs.sort_by(rank_order);
        let names: Vec<&str> = recs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Top", "Bob", "Amy", "Zed"]);
    }

    #[test]
    fn model_driven_recommendations() {
        let pool = small_pool();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        let model = BoardAttentionModel::new(BoardConfig::default());
        let result = ranker().recommend_with_model(&state, &pool, &model).unwrap();
        assert_eq!(result.horizon, 2);
        let total: f64 = result.position_drain.values().sum();
        assert!(approx_eq(total, 2.0, 1e-9));
        assert!(result.predicted_pick.is_some());
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn alternative_estimator_plugs_in() {
        let pool = small_pool();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        let r = ranker().with_estimator(Box::new(SurvivalWeightedEstimator { floor_ppg: 7.0 }));
        let hazards = vec![HazardMap::new(), HazardMap::new()];
        let result = r.recommend(&state, &pool, &hazards, 2).unwrap();
        assert_eq!(result.diagnostics.best_now, result.diagnostics.expected_best);
    }

    #[test]
    fn adp_tags() {
        assert_eq!(adp_value_tag(None, 10), "N/A");
        assert_eq!(adp_value_tag(Some(f64::NAN), 10), "N/A");
        assert_eq!(adp_value_tag(Some(4.6), 10), "value +5");
        assert_eq!(adp_value_tag(Some(12.2), 10), "reach 2");
        assert_eq!(adp_value_tag(Some(10.4), 10), "at ADP");
        assert_eq!(adp_value_tag(Some(10.5), 10), "at ADP");
    }

    #[test]
    fn summary_mentions_top_pick() {
        let pool = small_pool();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        let hazards = vec![HazardMap::new(), HazardMap::new()];
        let result = ranker().recommend(&state, &pool, &hazards, 2).unwrap();
        let text = format_summary(&result, &state);
        let top = result.top().unwrap();
        assert!(text.contains("Opponent picks before your next turn: 2"));
        assert!(text.contains(&format!("Top pick for your next turn: {}", top.name)));
    }

    #[test]
    fn result_serializes_to_json() {
        let pool = small_pool();
        let state = DraftState::new(2, 5, 0, STANDARD_LINEUP).unwrap();
        let hazards = vec![HazardMap::new(), HazardMap::new()];
        let result = ranker().recommend(&state, &pool, &hazards, 2).unwrap();
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["horizon"], 2);
        assert!(v["recommendations"].as_array().unwrap().len() <= 12);
        assert!(v["diagnostics"]["replacement"]["QB"].is_number());
    }

    #[test]
    fn find_players_by_substring() {
        let pool = small_pool();
        let found = find_players(&pool, " alpha ");
        let ids: Vec<u32> = found.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 3, 6, 9]);
        assert!(find_players(&pool, "  ").is_empty());
    }
}
