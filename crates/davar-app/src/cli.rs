// Command dispatch for the `davar` binary.
//
// Every command loads config and the player pool from the base directory,
// replays the pick log (if configured), and prints to stdout. Logs go to the
// file subscriber installed by main.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use davar_core::config::{self, Config};
use davar_core::draft::state::DraftState;
use davar_core::hazard::board::BoardAttentionModel;
use davar_core::projections::{self, index_by_id, Player};
use davar_core::recommend::{find_players, format_summary, Ranker};
use davar_core::session::{InMemoryDraftStore, RecommendationService};
use davar_core::valuation::replacement::replacement_levels;

const USAGE: &str = "usage: davar <recommend [--json]|predict|lineup [team]|replacement|search <name>>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Recommend,
    Predict,
    Lineup,
    Replacement,
    Search,
}

/// `args[0]` is the program name.
pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("recommend") => Some(Command::Recommend),
        Some("predict") => Some(Command::Predict),
        Some("lineup") => Some(Command::Lineup),
        Some("replacement") => Some(Command::Replacement),
        Some("search") => Some(Command::Search),
        _ => None,
    }
}

/// Run one command and return the process exit code: 0 on success, 1 on a
/// runtime failure, 2 on bad usage.
pub async fn run_with_args(base_dir: &Path, args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };
    match command {
        Command::Recommend => {
            let json = args.iter().skip(2).any(|a| a == "--json");
            report(command, handle_recommend(base_dir, json).await)
        }
        Command::Predict => report(command, handle_predict(base_dir)),
        Command::Lineup => handle_lineup(base_dir, args.get(2)),
        Command::Replacement => report(command, handle_replacement(base_dir)),
        Command::Search => match args.get(2).filter(|q| !q.trim().is_empty()) {
            Some(query) => report(command, handle_search(base_dir, query)),
            None => {
                eprintln!("usage: davar search <name>");
                2
            }
        },
    }
}

fn report(command: Command, result: anyhow::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            error!("{:?} failed: {:#}", command, err);
            eprintln!("error: {err:#}");
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

struct LoadedDraft {
    config: Config,
    pool: Vec<Player>,
    state: DraftState,
}

fn load_draft(base_dir: &Path) -> anyhow::Result<LoadedDraft> {
    let config = config::load_config_in(base_dir).context("failed to load configuration")?;
    info!(
        "config loaded: league={}, {} teams, {} rounds",
        config.league.name, config.league.num_teams, config.league.rounds
    );

    let players_path = base_dir.join(&config.data_paths.players);
    let pool = projections::load_players(&players_path)
        .with_context(|| format!("failed to load players from {}", players_path.display()))?;
    info!("loaded {} players", pool.len());

    let mut state = config.league.new_draft().context("invalid league settings")?;
    if let Some(picks) = &config.data_paths.picks {
        let picks_path = base_dir.join(picks);
        let rows = projections::load_pick_log(&picks_path)
            .with_context(|| format!("failed to load pick log from {}", picks_path.display()))?;
        state
            .replay_pick_log(&rows, &pool)
            .context("failed to replay pick log")?;
        info!("replayed {} picks", rows.len());
    }

    Ok(LoadedDraft {
        config,
        pool,
        state,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_recommend(base_dir: &Path, json: bool) -> anyhow::Result<()> {
    let LoadedDraft {
        config,
        pool,
        state,
    } = load_draft(base_dir)?;
    if state.is_complete() {
        println!("Draft complete after {} picks.", state.total_picks());
        return Ok(());
    }

    let store = Arc::new(InMemoryDraftStore::new());
    let session = store.create_session(state.clone(), pool);
    let service = RecommendationService::new(
        store.clone(),
        Ranker::new(config.strategy.scoring.clone()),
        Arc::new(BoardAttentionModel::new(config.strategy.board.clone())),
    );
    let result = service
        .recommendations(&session)
        .await
        .context("failed to compute recommendations")?;
    store.end_session(&session);

    if json {
        let payload =
            serde_json::to_string_pretty(&result).context("failed to serialize recommendations")?;
        println!("{payload}");
    } else {
        print!("{}", format_summary(&result, &state));
    }
    Ok(())
}

fn handle_predict(base_dir: &Path) -> anyhow::Result<()> {
    let LoadedDraft {
        config,
        pool,
        state,
    } = load_draft(base_dir)?;
    let Some(owner) = state.owner_of_current_pick() else {
        println!("Draft complete after {} picks.", state.total_picks());
        return Ok(());
    };

    let available = state.available(&pool);
    let model = BoardAttentionModel::new(config.strategy.board);
    match model.predict_current_pick(&state, &available) {
        Some((id, prob)) => {
            let by_id = index_by_id(&pool);
            let name = by_id.get(&id).map(|p| p.name.as_str()).unwrap_or("unknown");
            let pos = by_id
                .get(&id)
                .map(|p| p.position.to_string())
                .unwrap_or_default();
            println!(
                "Pick {} (team {}): {} ({}) p={:.0}%",
                state.current_pick(),
                owner,
                name,
                pos,
                prob * 100.0
            );
        }
        None => println!(
            "Pick {} (team {}): no draftable player left",
            state.current_pick(),
            owner
        ),
    }
    Ok(())
}

fn handle_lineup(base_dir: &Path, team_arg: Option<&String>) -> i32 {
    let loaded = match load_draft(base_dir) {
        Ok(loaded) => loaded,
        Err(err) => return report(Command::Lineup, Err(err)),
    };
    let team = match team_arg {
        None => loaded.state.user_team,
        Some(raw) => match raw.parse::<usize>() {
            Ok(t) if t < loaded.state.team_count => t,
            _ => {
                eprintln!(
                    "invalid team '{raw}': expected 0..{}",
                    loaded.state.team_count - 1
                );
                return 2;
            }
        },
    };

    let by_id = index_by_id(&loaded.pool);
    let view = loaded.state.rosters[team].lineup_view(&loaded.state.lineup, &by_id);
    println!("Team {team} lineup");
    for entry in view.starters.iter().chain(view.bench.iter()) {
        println!(
            "  {:<4} {:<24} {:<3} {:>6.2}",
            entry.slot, entry.name, entry.position, entry.ppg
        );
    }
    if view.starters.is_empty() && view.bench.is_empty() {
        println!("  (no picks yet)");
    }
    0
}

fn handle_replacement(base_dir: &Path) -> anyhow::Result<()> {
    let LoadedDraft {
        config: _,
        pool,
        state,
    } = load_draft(base_dir)?;
    let full = replacement_levels(&pool, state.team_count, &state.lineup)
        .context("failed to compute preseason replacement levels")?;
    let live = replacement_levels(state.available(&pool), state.team_count, &state.lineup)
        .context("failed to compute live replacement levels")?;

    println!("{:<4} {:>9} {:>9}", "Pos", "Preseason", "Live");
    for (pos, value) in full.as_values() {
        println!("{:<4} {:>9.2} {:>9.2}", pos, value, live[*pos]);
    }
    Ok(())
}

fn handle_search(base_dir: &Path, query: &str) -> anyhow::Result<()> {
    let LoadedDraft {
        config: _,
        pool,
        state,
    } = load_draft(base_dir)?;
    let found = find_players(&pool, query);
    if found.is_empty() {
        println!("No players match '{}'", query.trim());
        return Ok(());
    }
    for p in found {
        let status = if state.is_taken(p.id) {
            "drafted"
        } else {
            "available"
        };
        println!(
            "{:<6} {:<24} {:<3} {:>6.2}  {}",
            p.id.to_string(),
            p.name,
            p.position,
            p.ppg,
            status
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_known_commands() {
        assert_eq!(
            parse_command(&args(&["davar", "recommend", "--json"])),
            Some(Command::Recommend)
        );
        assert_eq!(parse_command(&args(&["davar", "lineup", "3"])), Some(Command::Lineup));
        assert_eq!(parse_command(&args(&["davar", "search"])), Some(Command::Search));
    }

    #[test]
    fn rejects_unknown_or_missing_command() {
        assert_eq!(parse_command(&args(&["davar"])), None);
        assert_eq!(parse_command(&args(&["davar", "draft"])), None);
    }
}
