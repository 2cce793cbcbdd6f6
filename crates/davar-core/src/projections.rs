// Player pool: validated player records and CSV loading.
//
// Reads a flat projections CSV (one row per player) and validates every row
// through `Player::new`, so the rest of the engine never sees a player with an
// unknown position or a negative projection.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::draft::pick::{PlayerId, Position};
use crate::error::DraftError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A rankable player. Immutable once loaded into a draft session.
///
/// Deserializing goes through the same checks as [`Player::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlayerRow")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team: Option<String>,
    /// Projected points per game.
    pub ppg: f64,
    /// Average draft position, if known.
    pub adp: Option<f64>,
    /// Default ESPN board rank, if known.
    pub espn_rank: Option<f64>,
    /// Consensus rank across sources, if known.
    pub global_rank: Option<f64>,
}

impl Player {
    /// Build a player, validating the position tag and projection.
    ///
    /// `ppg` must be finite and non-negative; `position` must be one of
    /// QB, RB, WR, TE.
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        position: &str,
        ppg: f64,
    ) -> Result<Self, DraftError> {
        let name = name.into();
        let position = Position::from_str_pos(position).ok_or_else(|| {
            DraftError::validation(
                "position",
                format!("`{position}` for player '{name}' is not one of QB, RB, WR, TE"),
            )
        })?;
        if !ppg.is_finite() || ppg < 0.0 {
            return Err(DraftError::validation(
                "ppg",
                format!("must be a non-negative number for player '{name}', got {ppg}"),
            ));
        }
        Ok(Player {
            id,
            name,
            position,
            team: None,
            ppg,
            adp: None,
            espn_rank: None,
            global_rank: None,
        })
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Attach an ADP. Non-finite values are rejected.
    pub fn with_adp(mut self, adp: f64) -> Result<Self, DraftError> {
        self.adp = Some(finite_rank("adp", adp)?);
        Ok(self)
    }

    pub fn with_espn_rank(mut self, rank: f64) -> Result<Self, DraftError> {
        self.espn_rank = Some(finite_rank("espn_rank", rank)?);
        Ok(self)
    }

    pub fn with_global_rank(mut self, rank: f64) -> Result<Self, DraftError> {
        self.global_rank = Some(finite_rank("global_rank", rank)?);
        Ok(self)
    }
}

fn finite_rank(field: &str, value: f64) -> Result<f64, DraftError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DraftError::validation(field, format!("must be finite, got {value}")))
    }
}

/// Look up players by identity.
pub fn index_by_id(players: &[Player]) -> HashMap<PlayerId, &Player> {
    players.iter().map(|p| (p.id, p)).collect()
}

/// Order players by descending ppg, breaking ties by name then id.
pub fn by_ppg_desc(a: &Player, b: &Player) -> std::cmp::Ordering {
    b.ppg
        .total_cmp(&a.ppg)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// One row of the player pool CSV. Extra columns are ignored; empty
/// optional cells deserialize to `None`.
#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    id: u32,
    name: String,
    position: String,
    #[serde(default)]
    team: Option<String>,
    ppg: f64,
    #[serde(default)]
    adp: Option<f64>,
    #[serde(default)]
    espn_rank: Option<f64>,
    #[serde(default)]
    global_rank: Option<f64>,
}

impl RawPlayerRow {
    fn into_player(self) -> Result<Player, DraftError> {
        let mut player = Player::new(PlayerId(self.id), self.name.trim(), &self.position, self.ppg)?;
        if let Some(team) = self.team.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            player = player.with_team(team);
        }
        if let Some(adp) = self.adp {
            player = player.with_adp(adp)?;
        }
        if let Some(rank) = self.espn_rank {
            player = player.with_espn_rank(rank)?;
        }
        if let Some(rank) = self.global_rank {
            player = player.with_global_rank(rank)?;
        }
        Ok(player)
    }
}

impl TryFrom<RawPlayerRow> for Player {
    type Error = DraftError;

    fn try_from(raw: RawPlayerRow) -> Result<Self, Self::Error> {
        raw.into_player()
    }
}

/// One row of a pick log CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PickLogRow {
    pub pick_number: u32,
    pub player_id: u32,
}

// ---------------------------------------------------------------------------
// Reader-based loaders (enable testing without temp files)
// ---------------------------------------------------------------------------

/// Parse a player pool. Malformed or invalid rows are skipped with a
/// warning; duplicate ids, an unreadable header and read failures are errors.
pub fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, ProjectionError> {
    let csv_error = |source: csv::Error| ProjectionError::Csv {
        path: READER_PATH.to_string(),
        source,
    };
    let mut reader = csv::Reader::from_reader(rdr);
    reader.headers().map_err(csv_error)?;
    let mut players = Vec::new();
    let mut seen = HashSet::new();
    for result in reader.deserialize::<RawPlayerRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) if e.is_io_error() => return Err(csv_error(e)),
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };
        let id = raw.id;
        match raw.into_player() {
            Ok(player) => {
                if !seen.insert(player.id) {
                    return Err(ProjectionError::Validation(format!(
                        "duplicate player id {id} ('{}')",
                        player.name
                    )));
                }
                players.push(player);
            }
            Err(e) => warn!("skipping player {}: {}", id, e),
        }
    }
    Ok(players)
}

/// Stand-in path for CSV errors raised before a file path is known.
const READER_PATH: &str = "<reader>";

/// Parse a pick log, in file order.
pub fn load_pick_log_from_reader<R: Read>(rdr: R) -> Result<Vec<PickLogRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    reader.deserialize::<PickLogRow>().collect()
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load and validate a player pool from a CSV file.
pub fn load_players(path: &Path) -> Result<Vec<Player>, ProjectionError> {
    let file = std::fs::File::open(path).map_err(|e| ProjectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    // the reader doesn't know the file name; attach it
    let players = load_players_from_reader(file).map_err(|e| match e {
        ProjectionError::Csv { source, .. } => ProjectionError::Csv {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })?;
    if players.is_empty() {
        return Err(ProjectionError::Validation(format!(
            "player CSV {} produced zero valid rows",
            path.display()
        )));
    }
    Ok(players)
}

/// Load a pick log from a CSV file.
pub fn load_pick_log(path: &Path) -> Result<Vec<PickLogRow>, ProjectionError> {
    let file = std::fs::File::open(path).map_err(|e| ProjectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_pick_log_from_reader(file).map_err(|e| ProjectionError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
