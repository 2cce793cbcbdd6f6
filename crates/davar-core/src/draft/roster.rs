// Lineup requirements and per-team roster tracking.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::pick::{PlayerId, Position};
use crate::projections::{by_ppg_desc, Player};

/// Starting-lineup slot counts per team. FLEX may be filled by RB, WR, or TE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupRequirements {
    #[serde(rename = "QB")]
    pub qb: u32,
    #[serde(rename = "RB")]
    pub rb: u32,
    #[serde(rename = "WR")]
    pub wr: u32,
    #[serde(rename = "TE")]
    pub te: u32,
    #[serde(rename = "FLEX")]
    pub flex: u32,
}

/// QB=1, RB=2, WR=2, TE=1, FLEX=1.
pub const STANDARD_LINEUP: LineupRequirements = LineupRequirements {
    qb: 1,
    rb: 2,
    wr: 2,
    te: 1,
    flex: 1,
};

impl Default for LineupRequirements {
    fn default() -> Self {
        STANDARD_LINEUP
    }
}

impl LineupRequirements {
    /// Dedicated slot count for a position (FLEX excluded).
    pub fn slots_for(&self, pos: Position) -> u32 {
        match pos {
            Position::QB => self.qb,
            Position::RB => self.rb,
            Position::WR => self.wr,
            Position::TE => self.te,
        }
    }

    fn slots_for_mut(&mut self, pos: Position) -> &mut u32 {
        match pos {
            Position::QB => &mut self.qb,
            Position::RB => &mut self.rb,
            Position::WR => &mut self.wr,
            Position::TE => &mut self.te,
        }
    }

    /// Total starters per team, FLEX included.
    pub fn starters(&self) -> u32 {
        self.qb + self.rb + self.wr + self.te + self.flex
    }
}

/// A single team's picks and its remaining starting needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRoster {
    /// 0-based team index in draft order.
    pub team: usize,
    /// Drafted players in pick order.
    pub picks: Vec<PlayerId>,
    /// Unfilled starting slots. Never negative.
    pub needs: LineupRequirements,
}

impl TeamRoster {
    pub fn new(team: usize, lineup: LineupRequirements) -> Self {
        TeamRoster {
            team,
            picks: Vec::new(),
            needs: lineup,
        }
    }

    /// Record a drafted player.
    ///
    /// Fills the exact position slot first, then FLEX for RB/WR/TE. Once both
    /// are exhausted the pick is a bench pick and `needs` is unchanged.
    pub fn add_player(&mut self, id: PlayerId, pos: Position) {
        self.picks.push(id);
        let exact = self.needs.slots_for_mut(pos);
        if *exact > 0 {
            *exact -= 1;
        } else if pos.is_flex_eligible() && self.needs.flex > 0 {
            self.needs.flex -= 1;
        }
    }

    /// Whether a player at `pos` would still fill a starting slot.
    pub fn can_draft(&self, pos: Position) -> bool {
        self.needs.slots_for(pos) > 0 || (pos.is_flex_eligible() && self.needs.flex > 0)
    }

    /// Number of starting slots still open.
    pub fn open_slots(&self) -> u32 {
        self.needs.starters()
    }

    /// Arrange this team's players into a display lineup.
    ///
    /// Greedy by ppg: the best players at each position take its dedicated
    /// slots, the best leftover RB/WR/TE take FLEX, everyone else is bench.
    /// Ids missing from `players` are ignored.
    pub fn lineup_view(
        &self,
        lineup: &LineupRequirements,
        players: &HashMap<PlayerId, &Player>,
    ) -> LineupView {
        let mut rostered: Vec<&Player> = self
            .picks
            .iter()
            .filter_map(|id| players.get(id).copied())
            .collect();
        rostered.sort_by(|a, b| by_ppg_desc(a, b));

        let mut view = LineupView::default();
        let mut leftovers: Vec<&Player> = Vec::new();

        for pos in Position::ALL {
            let mut open = lineup.slots_for(pos);
            for p in rostered.iter().filter(|p| p.position == pos) {
                if open > 0 {
                    view.starters.push(LineupEntry::new(pos.display_str(), p));
                    open -= 1;
                } else {
                    leftovers.push(p);
                }
            }
        }

        // leftovers are grouped by position; restore ppg order before FLEX
        leftovers.sort_by(|a, b| by_ppg_desc(a, b));
        let mut flex_open = lineup.flex;
        for p in leftovers {
            if flex_open > 0 && p.position.is_flex_eligible() {
                view.starters.push(LineupEntry::new("FLEX", p));
                flex_open -= 1;
            } else {
                view.bench.push(LineupEntry::new("BE", p));
            }
        }
        view
    }
}

/// One row of a display lineup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupEntry {
    pub slot: &'static str,
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    pub ppg: f64,
}

impl LineupEntry {
    fn new(slot: &'static str, p: &Player) -> Self {
        LineupEntry {
            slot,
            player_id: p.id,
            name: p.name.clone(),
            position: p.position,
            ppg: p.ppg,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineupView {
    pub starters: Vec<LineupEntry>,
    pub bench: Vec<LineupEntry>,
}
