// Snake draft state: pick ownership, committed picks, team rosters.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::info;

use super::pick::{DraftPick, PlayerId, Position};
use super::roster::{LineupRequirements, TeamRoster};
use crate::error::{DraftError, Result};
use crate::projections::{PickLogRow, Player};

/// 0-based index of the team that owns `pick_number` in a snake draft.
///
/// Odd rounds run 0..N-1, even rounds run N-1..0, so pick N and pick N+1 go
/// to the same team. `pick_number` is 1-based; `team_count` must be positive.
pub fn pick_owner(pick_number: u32, team_count: usize) -> usize {
    let n = team_count as u32;
    let round = pick_number.div_ceil(n);
    let index_in_round = pick_number.saturating_sub(1) % n;
    if round % 2 == 0 {
        (n - 1 - index_in_round) as usize
    } else {
        index_in_round as usize
    }
}

/// A draft is complete once every team has made every round's pick.
pub fn is_draft_complete(picks_made: usize, team_count: usize, rounds: u32) -> bool {
    picks_made >= team_count * rounds as usize
}

/// The complete state of a snake draft.
#[derive(Debug, Clone, Serialize)]
pub struct DraftState {
    pub team_count: usize,
    pub rounds: u32,
    /// Index into `rosters` for the user's team.
    pub user_team: usize,
    pub lineup: LineupRequirements,
    /// Committed picks; `picks[i].pick_number == i + 1`.
    pub picks: Vec<DraftPick>,
    pub rosters: Vec<TeamRoster>,
    #[serde(skip)]
    taken: HashSet<PlayerId>,
}

impl DraftState {
    /// Create an empty draft.
    pub fn new(
        team_count: usize,
        rounds: u32,
        user_team: usize,
        lineup: LineupRequirements,
    ) -> Result<Self> {
        if team_count == 0 {
            return Err(DraftError::validation("team_count", "must be greater than 0"));
        }
        if rounds == 0 {
            return Err(DraftError::validation("rounds", "must be greater than 0"));
        }
        if user_team >= team_count {
            return Err(DraftError::validation(
                "user_team",
                format!("must be less than team_count ({team_count}), got {user_team}"),
            ));
        }
        Ok(DraftState {
            team_count,
            rounds,
            user_team,
            lineup,
            picks: Vec::new(),
            rosters: (0..team_count).map(|t| TeamRoster::new(t, lineup)).collect(),
            taken: HashSet::new(),
        })
    }

    /// The next pick number to be made (1-based).
    pub fn current_pick(&self) -> u32 {
        self.picks.len() as u32 + 1
    }

    pub fn total_picks(&self) -> u32 {
        self.team_count as u32 * self.rounds
    }

    pub fn is_complete(&self) -> bool {
        is_draft_complete(self.picks.len(), self.team_count, self.rounds)
    }

    pub fn pick_owner(&self, pick_number: u32) -> usize {
        pick_owner(pick_number, self.team_count)
    }

    /// Team on the clock, or `None` once the draft is complete.
    pub fn owner_of_current_pick(&self) -> Option<usize> {
        if self.is_complete() {
            None
        } else {
            Some(self.pick_owner(self.current_pick()))
        }
    }

    pub fn is_user_on_clock(&self) -> bool {
        self.owner_of_current_pick() == Some(self.user_team)
    }

    pub fn is_taken(&self, id: PlayerId) -> bool {
        self.taken.contains(&id)
    }

    pub fn user_roster(&self) -> &TeamRoster {
        &self.rosters[self.user_team]
    }

    /// Number of opponent picks before the user's next turn.
    ///
    /// If the user is on the clock, their current pick is skipped and the
    /// count runs to the turn after it. Never counts past the last pick.
    pub fn steps_until_user_next_pick(&self) -> u32 {
        let total = self.total_picks();
        let mut cur = self.current_pick();
        if cur <= total && self.pick_owner(cur) == self.user_team {
            cur += 1;
        }
        let mut steps = 0;
        while cur + steps <= total && self.pick_owner(cur + steps) != self.user_team {
            steps += 1;
        }
        steps
    }

    /// Players in `pool` not yet drafted, in pool order.
    pub fn available<'a>(&self, pool: &'a [Player]) -> Vec<&'a Player> {
        pool.iter().filter(|p| !self.taken.contains(&p.id)).collect()
    }

    /// Commit the next pick.
    ///
    /// `team` must be the owner of the current pick. Fails with
    /// `InvalidPick` if the player is already taken, the draft is complete,
    /// or the team is not on the clock. Needs are never a reason to reject.
    pub fn record_pick(
        &mut self,
        player_id: PlayerId,
        position: Position,
        team: usize,
    ) -> Result<DraftPick> {
        if self.is_complete() {
            return Err(DraftError::InvalidPick(format!(
                "draft is complete after {} picks",
                self.total_picks()
            )));
        }
        if self.taken.contains(&player_id) {
            return Err(DraftError::InvalidPick(format!(
                "player {player_id} was already drafted"
            )));
        }
        let pick_number = self.current_pick();
        let owner = self.pick_owner(pick_number);
        if team != owner {
            return Err(DraftError::InvalidPick(format!(
                "pick {pick_number} belongs to team {owner}, not team {team}"
            )));
        }

        let pick = DraftPick {
            pick_number,
            team,
            player_id,
            position,
        };
        self.rosters[team].add_player(player_id, position);
        self.taken.insert(player_id);
        self.picks.push(pick.clone());
        info!(
            "pick {} recorded: team {} took {} ({})",
            pick_number, team, player_id, position
        );
        Ok(pick)
    }

    /// Commit `player` for whichever team is on the clock.
    pub fn draft_player(&mut self, player: &Player) -> Result<DraftPick> {
        let team = self
            .owner_of_current_pick()
            .ok_or_else(|| DraftError::InvalidPick("draft is already complete".into()))?;
        self.record_pick(player.id, player.position, team)
    }

    /// Rebuild the state from a saved pick sequence.
    ///
    /// Rosters and the taken set are reset before replay. Each pick must carry
    /// the next sequential pick number. On error the state is left as it was.
    pub fn restore_from_picks(&mut self, picks: Vec<DraftPick>) -> Result<()> {
        let mut restored =
            DraftState::new(self.team_count, self.rounds, self.user_team, self.lineup)?;
        for pick in picks {
            restored.expect_pick_number(pick.pick_number)?;
            restored.record_pick(pick.player_id, pick.position, pick.team)?;
        }
        *self = restored;
        Ok(())
    }

    /// Replay a pick log against `pool`, deriving each pick's team from the
    /// snake order. Either every row lands or none do.
    pub fn replay_pick_log(&mut self, rows: &[PickLogRow], pool: &[Player]) -> Result<()> {
        let by_id: HashMap<PlayerId, &Player> = pool.iter().map(|p| (p.id, p)).collect();
        let mut replayed = self.clone();
        for row in rows {
            replayed.expect_pick_number(row.pick_number)?;
            let player = by_id.get(&PlayerId(row.player_id)).ok_or_else(|| {
                DraftError::InvalidPick(format!(
                    "pick {} names unknown player {}",
                    row.pick_number,
                    PlayerId(row.player_id)
                ))
            })?;
            replayed.draft_player(player)?;
        }
        *self = replayed;
        Ok(())
    }

    fn expect_pick_number(&self, pick_number: u32) -> Result<()> {
        let current = self.current_pick();
        if pick_number != current {
            return Err(DraftError::InvalidPick(format!(
                "pick number {pick_number} is out of sequence, expected {current}"
            )));
        }
        Ok(())
    }
}
