// Positions, player identities, and committed pick records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DraftError;

/// Rankable player positions. FLEX is a lineup slot, not a player position,
/// and lives on `LineupRequirements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
}

impl Position {
    /// All positions in deterministic display order.
    pub const ALL: [Position; 4] = [Position::QB, Position::RB, Position::WR, Position::TE];

    /// Parse a position tag. Case-insensitive, surrounding whitespace ignored.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::QB),
            "RB" => Some(Position::RB),
            "WR" => Some(Position::WR),
            "TE" => Some(Position::TE),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
        }
    }

    /// Whether a player at this position may fill the FLEX slot.
    pub fn is_flex_eligible(&self) -> bool {
        matches!(self, Position::RB | Position::WR | Position::TE)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_str())
    }
}

impl FromStr for Position {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_str_pos(s).ok_or_else(|| DraftError::InvalidPosition(s.to_string()))
    }
}

/// Identity of a player, unique within a draft pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single committed draft pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    /// Sequential pick number (1-indexed).
    pub pick_number: u32,
    /// 0-based index of the team that owned the pick.
    pub team: usize,
    /// The drafted player.
    pub player_id: PlayerId,
    /// Position the player was drafted at.
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_pos_standard_positions() {
        assert_eq!(Position::from_str_pos("QB"), Some(Position::QB));
        assert_eq!(Position::from_str_pos("RB"), Some(Position::RB));
        assert_eq!(Position::from_str_pos("WR"), Some(Position::WR));
        assert_eq!(Position::from_str_pos("TE"), Some(Position::TE));
    }

    #[test]
    fn from_str_pos_case_insensitive_and_trimmed() {
        assert_eq!(Position::from_str_pos("qb"), Some(Position::QB));
        assert_eq!(Position::from_str_pos(" Wr "), Some(Position::WR));
    }

    #[test]
    fn from_str_pos_rejects_non_player_tags() {
        assert_eq!(Position::from_str_pos("FLEX"), None);
        assert_eq!(Position::from_str_pos("K"), None);
        assert_eq!(Position::from_str_pos("DST"), None);
        assert_eq!(Position::from_str_pos(""), None);
    }

    #[test]
    fn parse_reports_invalid_position() {
        let err = "K".parse::<Position>().unwrap_err();
        assert_eq!(err, DraftError::InvalidPosition("K".into()));
        assert_eq!("te".parse::<Position>().unwrap(), Position::TE);
    }

    #[test]
    fn display_str_roundtrip() {
        for pos in Position::ALL {
            assert_eq!(Position::from_str_pos(pos.display_str()), Some(pos));
            assert_eq!(format!("{pos}"), pos.display_str());
        }
    }

    #[test]
    fn flex_eligibility_excludes_quarterbacks() {
        assert!(!Position::QB.is_flex_eligible());
        assert!(Position::RB.is_flex_eligible());
        assert!(Position::WR.is_flex_eligible());
        assert!(Position::TE.is_flex_eligible());
    }

    #[test]
    fn position_serializes_as_tag() {
        let json = serde_json::to_string(&Position::WR).unwrap();
        assert_eq!(json, "\"WR\"");
        let id = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(id, "42");
    }
}
