// League and strategy settings from config/league.toml and config/strategy.toml.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::draft::roster::LineupRequirements;
use crate::draft::state::DraftState;
use crate::error::DraftError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing config file {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("cannot seed config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

/// Everything a draft run needs from the two config files.
#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: usize,
    pub rounds: u32,
    /// The user's 0-based draft slot.
    pub user_team: usize,
    /// `[league.lineup]`; the standard QB/2RB/2WR/TE/FLEX shape when omitted.
    #[serde(default)]
    pub lineup: LineupRequirements,
}

impl LeagueConfig {
    /// An empty draft shaped by this league.
    pub fn new_draft(&self) -> Result<DraftState, DraftError> {
        DraftState::new(self.num_teams, self.rounds, self.user_team, self.lineup)
    }
}

// ---------------------------------------------------------------------------
// strategy.toml
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    #[serde(default)]
    scoring: ScoringConfig,
    #[serde(default)]
    board: BoardConfig,
    data: DataPaths,
}

/// `[scoring]` and `[board]` together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyConfig {
    pub scoring: ScoringConfig,
    pub board: BoardConfig,
}

/// DAVAR weights and ranker sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight on the cost of waiting at the candidate's own position.
    pub alpha: f64,
    /// Weight on the largest cross-position hedge loss.
    pub beta: f64,
    /// Recommendations returned.
    pub top_n: usize,
    /// Available players (best by ppg) that get scored at all.
    pub candidate_pool_size: usize,
    /// Expected-best ppg used for a position with nobody left.
    pub expected_best_floor_ppg: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            alpha: 0.9,
            beta: 0.6,
            top_n: 12,
            candidate_pool_size: 60,
            expected_best_floor_ppg: 7.0,
        }
    }
}

/// Parameters of the opponent board-attention model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Players on screen at step 0 of the horizon.
    pub window: usize,
    /// Softmax sharpness over board rank inside the window.
    pub eta: f64,
    /// Players just below the window that still draw attention.
    pub tail_k: usize,
    /// Share of attention mass given to the tail.
    pub tail_weight: f64,
    /// Softmax sharpness inside the tail.
    pub eta_tail: f64,
    /// The window grows by one player every this many horizon steps.
    pub window_growth_every: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            window: 10,
            eta: 0.4,
            tail_k: 5,
            tail_weight: 0.10,
            eta_tail: 0.10,
            window_growth_every: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
    #[serde(default)]
    pub picks: Option<String>,
}

// ---------------------------------------------------------------------------
// Reading config/
// ---------------------------------------------------------------------------

const CONFIG_DIR: &str = "config";
const DEFAULTS_DIR: &str = "defaults";

/// Parse and validate `config/league.toml` and `config/strategy.toml` under
/// `base_dir`. Missing files are an error here; see [`load_config_in`] for the
/// variant that seeds them from `defaults/` first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let dir = base_dir.join(CONFIG_DIR);
    let LeagueFile { league } = parse_toml(&dir.join("league.toml"))?;
    let StrategyFile {
        scoring,
        board,
        data,
    } = parse_toml(&dir.join("strategy.toml"))?;

    let config = Config {
        league,
        strategy: StrategyConfig { scoring, board },
        data_paths: data,
    };
    validate(&config)?;
    Ok(config)
}

fn parse_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Seeding from defaults/
// ---------------------------------------------------------------------------

/// Copy every file in `defaults/` that `config/` lacks, skipping `*.example`
/// templates. Existing files are left alone. Returns the paths written.
///
/// With no `defaults/` this is a no-op as long as `config/` exists.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults = base_dir.join(DEFAULTS_DIR);
    let target_dir = base_dir.join(CONFIG_DIR);

    if !defaults.is_dir() {
        return if target_dir.is_dir() {
            Ok(Vec::new())
        } else {
            Err(seed_error(format!(
                "no {DEFAULTS_DIR}/ or {CONFIG_DIR}/ under {}",
                base_dir.display()
            )))
        };
    }

    std::fs::create_dir_all(&target_dir)
        .map_err(|e| seed_error(format!("cannot create {}: {e}", target_dir.display())))?;

    let mut sources: Vec<PathBuf> = std::fs::read_dir(&defaults)
        .map_err(|e| seed_error(format!("cannot list {}: {e}", defaults.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().map_or(true, |ext| ext != "example"))
        .collect();
    sources.sort();

    let mut written = Vec::new();
    for source in sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = target_dir.join(name);
        if copy_if_missing(&source, &target)? {
            written.push(target);
        }
    }
    Ok(written)
}

/// `Ok(false)` when `target` already exists.
fn copy_if_missing(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(seed_error(format!("cannot create {}: {e}", target.display()))),
    };
    let bytes = std::fs::read(source)
        .map_err(|e| seed_error(format!("cannot read {}: {e}", source.display())))?;
    dest.write_all(&bytes)
        .map_err(|e| seed_error(format!("cannot write {}: {e}", target.display())))?;
    Ok(true)
}

fn seed_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Seed missing files from `defaults/`, then load.
pub fn load_config_in(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

/// [`load_config_in`] for the working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from(CONFIG_DIR),
    })?;
    load_config_in(&cwd)
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;
    if league.num_teams == 0 {
        return Err(invalid("league.num_teams", "must be greater than 0"));
    }
    if league.rounds == 0 {
        return Err(invalid("league.rounds", "must be greater than 0"));
    }
    if league.user_team >= league.num_teams {
        return Err(invalid(
            "league.user_team",
            format!(
                "must be less than num_teams ({}), got {}",
                league.num_teams, league.user_team
            ),
        ));
    }

    let scoring = &config.strategy.scoring;
    let weights: &[(&str, f64)] = &[
        ("scoring.alpha", scoring.alpha),
        ("scoring.beta", scoring.beta),
        ("scoring.expected_best_floor_ppg", scoring.expected_best_floor_ppg),
    ];
    for (name, val) in weights {
        if !val.is_finite() || *val < 0.0 {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }
    let sizes: &[(&str, usize)] = &[
        ("scoring.top_n", scoring.top_n),
        ("scoring.candidate_pool_size", scoring.candidate_pool_size),
        ("board.window", config.strategy.board.window),
    ];
    for (name, val) in sizes {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    let board = &config.strategy.board;
    for (name, val) in [("board.eta", board.eta), ("board.eta_tail", board.eta_tail)] {
        if !val.is_finite() || val < 0.0 {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }
    if !(0.0..1.0).contains(&board.tail_weight) {
        return Err(invalid(
            "board.tail_weight",
            format!("must be in [0.0, 1.0), got {}", board.tail_weight),
        ));
    }
    if board.window_growth_every == 0 {
        return Err(invalid("board.window_growth_every", "must be > 0"));
    }

    if config.data_paths.players.trim().is_empty() {
        return Err(invalid("data.players", "must name a CSV file"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
