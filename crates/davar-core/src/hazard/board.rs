// Board-attention opponent model.
//
// Each opponent is assumed to pick off the top of the host site's draft
// board: attention decays with board rank (softmax over -eta * rank), a few
// players just below the visible window keep a small share, and players the
// team has no starting slot for are ignored.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::HazardMap;
use crate::config::BoardConfig;
use crate::draft::pick::PlayerId;
use crate::draft::roster::TeamRoster;
use crate::draft::state::DraftState;
use crate::projections::Player;

/// Rank assumed for a player missing the board's rank column.
pub const MISSING_RANK: f64 = 999.0;

// ---------------------------------------------------------------------------
// Board rank
// ---------------------------------------------------------------------------

/// Which rank field orders the draft board for a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankColumn {
    Espn,
    Global,
    Adp,
}

impl RankColumn {
    /// The first column any player in the pool carries: ESPN rank, then
    /// global rank, then ADP.
    pub fn detect<'a, I>(players: I) -> Self
    where
        I: IntoIterator<Item = &'a Player> + Clone,
    {
        if players.clone().into_iter().any(|p| p.espn_rank.is_some()) {
            RankColumn::Espn
        } else if players.into_iter().any(|p| p.global_rank.is_some()) {
            RankColumn::Global
        } else {
            RankColumn::Adp
        }
    }

    pub fn rank_of(&self, p: &Player) -> f64 {
        let rank = match self {
            RankColumn::Espn => p.espn_rank,
            RankColumn::Global => p.global_rank,
            RankColumn::Adp => p.adp,
        };
        rank.unwrap_or(MISSING_RANK)
    }
}

/// Rank used for display ordinals: the player's own best-known rank field.
pub fn display_rank(p: &Player) -> f64 {
    p.espn_rank.or(p.global_rank).or(p.adp).unwrap_or(MISSING_RANK)
}

/// 1-based position of each available player on the draft board.
pub fn board_ordinals(available: &[&Player]) -> HashMap<PlayerId, u32> {
    let mut sorted: Vec<&Player> = available.to_vec();
    sorted.sort_by(|a, b| {
        display_rank(a)
            .total_cmp(&display_rank(b))
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i as u32 + 1))
        .collect()
}

// ---------------------------------------------------------------------------
// Hazard model seam
// ---------------------------------------------------------------------------

/// Produces per-pick hazards for the opponents picking before the user.
pub trait HazardModel: Send + Sync {
    /// Hazards for a single pick by `team`, `step` picks into the horizon.
    fn pick_hazards(&self, available: &[&Player], team: &TeamRoster, step: u32) -> HazardMap;

    /// Hazards for the `horizon` picks between the user's turns.
    ///
    /// Step 0 is the first pick not made by the user: the current pick, or
    /// the one after it when the user is on the clock.
    fn horizon_hazards(
        &self,
        state: &DraftState,
        available: &[&Player],
        horizon: u32,
    ) -> Vec<HazardMap> {
        let first = first_opponent_pick(state);
        (0..horizon)
            .map(|step| {
                let owner = state.pick_owner(first + step);
                self.pick_hazards(available, &state.rosters[owner], step)
            })
            .collect()
    }
}

/// The first pick number the user does not own, counting from now.
pub fn first_opponent_pick(state: &DraftState) -> u32 {
    let cur = state.current_pick();
    if state.is_user_on_clock() {
        cur + 1
    } else {
        cur
    }
}

/// Most likely player in a hazard map, ties to the lower id.
pub fn most_likely(hazard: &HazardMap) -> Option<(PlayerId, f64)> {
    hazard
        .iter()
        .map(|(&id, &p)| (id, p))
        .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
}

// ---------------------------------------------------------------------------
// Board attention
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct BoardAttentionModel {
    pub params: BoardConfig,
}

impl BoardAttentionModel {
    pub fn new(params: BoardConfig) -> Self {
        BoardAttentionModel { params }
    }

    /// Prediction for whoever is on the clock right now, with its probability.
    pub fn predict_current_pick(
        &self,
        state: &DraftState,
        available: &[&Player],
    ) -> Option<(PlayerId, f64)> {
        let owner = state.owner_of_current_pick()?;
        let hazard = self.pick_hazards(available, &state.rosters[owner], 0);
        most_likely(&hazard)
    }

    /// One window pass. `None` when no draftable player gets any mass.
    fn window_probs(
        &self,
        board: &[(&Player, f64)],
        window: usize,
        team: &TeamRoster,
    ) -> Option<HazardMap> {
        let p = &self.params;
        let top_end = window.min(board.len());
        let top = &board[..top_end];
        let tail = &board[top_end..(top_end + p.tail_k).min(board.len())];

        let mut weighted: Vec<(&Player, f64)> = top
            .iter()
            .zip(softmax(top.iter().map(|(_, r)| -p.eta * r)))
            .map(|((pl, _), w)| (*pl, w))
            .collect();

        if !tail.is_empty() && p.tail_weight > 0.0 {
            for (_, w) in weighted.iter_mut() {
                *w *= 1.0 - p.tail_weight;
            }
            weighted.extend(
                tail.iter()
                    .zip(softmax(tail.iter().map(|(_, r)| -p.eta_tail * r)))
                    .map(|((pl, _), w)| (*pl, p.tail_weight * w)),
            );
        }

        weighted.retain(|(pl, w)| *w > 0.0 && team.can_draft(pl.position));
        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return None;
        }
        Some(weighted.into_iter().map(|(pl, w)| (pl.id, w / total)).collect())
    }
}

impl HazardModel for BoardAttentionModel {
    fn pick_hazards(&self, available: &[&Player], team: &TeamRoster, step: u32) -> HazardMap {
        if available.is_empty() {
            return HazardMap::new();
        }
        let column = RankColumn::detect(available.iter().copied());
        let mut board: Vec<(&Player, f64)> =
            available.iter().map(|p| (*p, column.rank_of(p))).collect();
        board.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.id.cmp(&b.0.id)));

        let growth = (step / self.params.window_growth_every.max(1)) as usize;
        let n = self.params.window + growth;
        let windows = [n, n.max(15), n.max(25), board.len()];

        for window in windows {
            if let Some(probs) = self.window_probs(&board, window, team) {
                return probs;
            }
        }

        debug!("team {} has no legal board pick; falling back", team.team);
        board
            .iter()
            .find(|(pl, _)| team.can_draft(pl.position))
            .map(|(pl, _)| HazardMap::from([(pl.id, 1.0)]))
            .unwrap_or_default()
    }
}

/// Numerically stable softmax.
fn softmax<I: IntoIterator<Item = f64>>(scores: I) -> Vec<f64> {
    let scores: Vec<f64> = scores.into_iter().collect();
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::pick::Position;
    use crate::draft::roster::STANDARD_LINEUP;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn ranked(id: u32, pos: &str, ppg: f64, rank: f64) -> Player {
        Player::new(PlayerId(id), format!("P{id}"), pos, ppg)
            .unwrap()
            .with_espn_rank(rank)
            .unwrap()
    }

    /// `n` players cycling RB, WR, QB, TE, ESPN rank == id.
    fn pool(n: u32) -> Vec<Player> {
        let positions = ["RB", "WR", "QB", "TE"];
        (1..=n)
            .map(|i| ranked(i, positions[(i as usize - 1) % 4], 30.0 - i as f64 * 0.1, i as f64))
            .collect()
    }

    fn fresh_team() -> TeamRoster {
        TeamRoster::new(0, STANDARD_LINEUP)
    }

    #[test]
    fn rank_column_detection_order() {
        let a = Player::new(PlayerId(1), "A", "RB", 10.0).unwrap().with_adp(5.0).unwrap();
        let b = Player::new(PlayerId(2), "B", "RB", 10.0)
            .unwrap()
            .with_global_rank(3.0)
            .unwrap();
        let c = ranked(3, "WR", 9.0, 1.0);

        assert_eq!(RankColumn::detect([&a]), RankColumn::Adp);
        assert_eq!(RankColumn::detect([&a, &b]), RankColumn::Global);
        assert_eq!(RankColumn::detect([&a, &b, &c]), RankColumn::Espn);
        assert_eq!(RankColumn::Espn.rank_of(&a), MISSING_RANK);
    }

    #[test]
    fn hazards_sum_to_one_and_favor_top_rank() {
        let pool = pool(30);
        let avail: Vec<&Player> = pool.iter().collect();
        let model = BoardAttentionModel::default();
        let h = model.pick_hazards(&avail, &fresh_team(), 0);

        let total: f64 = h.values().sum();
        assert!(approx_eq(total, 1.0, 1e-9));
        // window 10 + tail 5
        assert_eq!(h.len(), 15);
        assert!(h[&PlayerId(1)] > h[&PlayerId(2)]);
        assert!(h[&PlayerId(10)] > 0.0);
        assert!(!h.contains_key(&PlayerId(16)));
    }

    #[test]
    fn tail_receives_configured_mass() {
        let pool = pool(30);
        let avail: Vec<&Player> = pool.iter().collect();
        let model = BoardAttentionModel::default();
        let h = model.pick_hazards(&avail, &fresh_team(), 0);
        let tail: f64 = (11..=15).map(|i| h[&PlayerId(i)]).sum();
        assert!(approx_eq(tail, 0.10, 1e-9));
    }

    #[test]
    fn no_tail_when_disabled() {
        let pool = pool(30);
        let avail: Vec<&Player> = pool.iter().collect();
        let model = BoardAttentionModel::new(BoardConfig {
            tail_weight: 0.0,
            ..BoardConfig::default()
        });
        let h = model.pick_hazards(&avail, &fresh_team(), 0);
        assert_eq!(h.len(), 10);
    }

    #[test]
    fn filled_positions_get_no_hazard() {
        let pool = pool(30);
        let avail: Vec<&Player> = pool.iter().collect();
        let mut team = fresh_team();
        team.add_player(PlayerId(900), Position::QB);
        let h = BoardAttentionModel::default().pick_hazards(&avail, &team, 0);
        for id in h.keys() {
            let p = pool.iter().find(|p| p.id == *id).unwrap();
            assert_ne!(p.position, Position::QB);
        }
        assert!(approx_eq(h.values().sum::<f64>(), 1.0, 1e-9));
    }

    #[test]
    fn window_widens_when_top_is_undraftable() {
        // twelve QBs on top of the board, then one TE
        let mut pool: Vec<Player> = (1..=12).map(|i| ranked(i, "QB", 20.0, i as f64)).collect();
        pool.push(ranked(13, "TE", 8.0, 40.0));
        let avail: Vec<&Player> = pool.iter().collect();
        let mut team = fresh_team();
        team.add_player(PlayerId(900), Position::QB);

        let model = BoardAttentionModel::new(BoardConfig {
            tail_k: 0,
            ..BoardConfig::default()
        });
        let h = model.pick_hazards(&avail, &team, 0);
        assert_eq!(h.len(), 1);
        assert!(approx_eq(h[&PlayerId(13)], 1.0, 1e-12));
    }

    #[test]
    fn no_legal_player_gives_empty_map() {
        let pool: Vec<Player> = (1..=3).map(|i| ranked(i, "QB", 20.0, i as f64)).collect();
        let avail: Vec<&Player> = pool.iter().collect();
        let mut team = fresh_team();
        team.add_player(PlayerId(900), Position::QB);
        assert!(BoardAttentionModel::default()
            .pick_hazards(&avail, &team, 0)
            .is_empty());
    }

    #[test]
    fn empty_pool_gives_empty_map() {
        let h = BoardAttentionModel::default().pick_hazards(&[], &fresh_team(), 0);
        assert!(h.is_empty());
    }

    #[test]
    fn window_grows_with_step() {
        let pool = pool(40);
        let avail: Vec<&Player> = pool.iter().collect();
        let model = BoardAttentionModel::new(BoardConfig {
            tail_k: 0,
            ..BoardConfig::default()
        });
        assert_eq!(model.pick_hazards(&avail, &fresh_team(), 5).len(), 10);
        assert_eq!(model.pick_hazards(&avail, &fresh_team(), 6).len(), 11);
        assert_eq!(model.pick_hazards(&avail, &fresh_team(), 13).len(), 12);
    }

    #[test]
    fn horizon_starts_after_user_pick() {
        let pool = pool(40);
        let avail: Vec<&Player> = pool.iter().collect();
        let mut state = DraftState::new(4, 10, 0, STANDARD_LINEUP).unwrap();
        // team 1 already filled its QB slot
        state.record_pick(PlayerId(100), Position::QB, 0).unwrap();
        state.record_pick(PlayerId(101), Position::QB, 1).unwrap();
        state.record_pick(PlayerId(102), Position::RB, 2).unwrap();
        state.record_pick(PlayerId(103), Position::RB, 3).unwrap();
        state.record_pick(PlayerId(104), Position::RB, 3).unwrap();
        state.record_pick(PlayerId(105), Position::RB, 2).unwrap();
        // pick 7 belongs to team 1; user (team 0) picks at 8 and 9
        assert_eq!(first_opponent_pick(&state), 7);
        assert_eq!(state.steps_until_user_next_pick(), 1);

        let model = BoardAttentionModel::default();
        let hazards = model.horizon_hazards(&state, &avail, 1);
        assert_eq!(hazards.len(), 1);
        assert!(hazards[0]
            .keys()
            .all(|id| pool.iter().find(|p| p.id == *id).unwrap().position != Position::QB));
    }

    #[test]
    fn first_opponent_pick_skips_user_turn() {
        let state = DraftState::new(4, 10, 0, STANDARD_LINEUP).unwrap();
        assert_eq!(first_opponent_pick(&state), 2);
        let state = DraftState::new(4, 10, 2, STANDARD_LINEUP).unwrap();
        assert_eq!(first_opponent_pick(&state), 1);
    }

    #[test]
    fn most_likely_ties_to_lower_id() {
        let h: HazardMap = [(PlayerId(7), 0.4), (PlayerId(3), 0.4), (PlayerId(9), 0.2)]
            .into_iter()
            .collect();
        assert_eq!(most_likely(&h), Some((PlayerId(3), 0.4)));
        assert_eq!(most_likely(&HazardMap::new()), None);
    }

    #[test]
    fn predict_current_pick_uses_team_on_clock() {
        let pool = pool(20);
        let avail: Vec<&Player> = pool.iter().collect();
        let state = DraftState::new(4, 10, 2, STANDARD_LINEUP).unwrap();
        let (id, p) = BoardAttentionModel::default()
            .predict_current_pick(&state, &avail)
            .unwrap();
        assert_eq!(id, PlayerId(1));
        assert!(p > 0.0 && p < 1.0);
    }

    #[test]
    fn board_ordinals_use_best_known_rank() {
        let a = Player::new(PlayerId(1), "A", "RB", 10.0).unwrap().with_adp(2.0).unwrap();
        let b = ranked(2, "WR", 9.0, 5.0);
        let c = Player::new(PlayerId(3), "C", "TE", 8.0).unwrap();
        let ords = board_ordinals(&[&c, &b, &a]);
        assert_eq!(ords[&PlayerId(1)], 1);
        assert_eq!(ords[&PlayerId(2)], 2);
        assert_eq!(ords[&PlayerId(3)], 3);
    }
}
