// Draft sessions behind an async store, plus the service that ranks picks
// for a stored session off the executor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::draft::pick::{DraftPick, PlayerId};
use crate::draft::state::DraftState;
use crate::error::{DraftError, Result};
use crate::hazard::board::HazardModel;
use crate::hazard::HazardMap;
use crate::projections::Player;
use crate::recommend::{Ranker, RecommendationResult};
use crate::valuation::replacement::{replacement_levels, ReplacementLevels};

// ---------------------------------------------------------------------------
// Persistence seam
// ---------------------------------------------------------------------------

/// Where sessions live. The engine only reads snapshots and submits picks.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// The session's draft and its undrafted players, read together so both
    /// describe the same pick.
    async fn snapshot(&self, session: &str) -> Result<(DraftState, Vec<Player>)>;

    /// Players not yet drafted in `session`.
    async fn load_available_players(&self, session: &str) -> Result<Vec<Player>>;

    /// A snapshot of the session's draft.
    async fn get_draft_state(&self, session: &str) -> Result<DraftState>;

    /// Commit `player` at `expected_pick`.
    ///
    /// Fails with `StalePick` if the draft has already moved past (or not yet
    /// reached) `expected_pick`, so of two racing submissions exactly one
    /// lands.
    async fn record_pick(
        &self,
        session: &str,
        expected_pick: u32,
        player: PlayerId,
    ) -> Result<DraftPick>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

struct Session {
    state: DraftState,
    pool: Arc<Vec<Player>>,
}

/// Sessions held in process memory, each behind its own lock.
#[derive(Default)]
pub struct InMemoryDraftStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    seq: AtomicU64,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session over `pool` and return its id.
    pub fn create_session(&self, state: DraftState, pool: Vec<Player>) -> String {
        let id = generate_session_id(self.seq.fetch_add(1, Ordering::Relaxed));
        let session = Session {
            state,
            pool: Arc::new(pool),
        };
        self.sessions
            .write()
            .expect("session map lock poisoned")
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        info!("created draft session {}", id);
        id
    }

    /// Drop a finished session. Returns whether it existed.
    pub fn end_session(&self, session: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .expect("session map lock poisoned")
            .remove(session)
            .is_some();
        if removed {
            info!("ended draft session {}", session);
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().expect("session map lock poisoned").len()
    }

    fn session(&self, session: &str) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .expect("session map lock poisoned")
            .get(session)
            .cloned()
            .ok_or_else(|| DraftError::UnknownSession(session.to_string()))
    }

    /// Lock one session.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding it).
    fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
        session.lock().expect("draft session mutex poisoned")
    }

    /// Synchronous check-and-append behind [`DraftStore::record_pick`].
    pub fn submit_pick(
        &self,
        session: &str,
        expected_pick: u32,
        player: PlayerId,
    ) -> Result<DraftPick> {
        let handle = self.session(session)?;
        let mut guard = Self::lock(&handle);
        let current = guard.state.current_pick();
        if expected_pick != current {
            debug!(
                "session {}: stale pick {} rejected at pick {}",
                session, expected_pick, current
            );
            return Err(DraftError::StalePick {
                submitted: expected_pick,
                current,
            });
        }
        let pool = Arc::clone(&guard.pool);
        let player = pool.iter().find(|p| p.id == player).ok_or_else(|| {
            DraftError::InvalidPick(format!("player {player} is not in this draft's pool"))
        })?;
        guard.state.draft_player(player)
    }

    /// Snapshot of state and remaining players, taken under one lock.
    pub fn read_snapshot(&self, session: &str) -> Result<(DraftState, Vec<Player>)> {
        let handle = self.session(session)?;
        let guard = Self::lock(&handle);
        let available = guard.state.available(&guard.pool).into_iter().cloned().collect();
        Ok((guard.state.clone(), available))
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn snapshot(&self, session: &str) -> Result<(DraftState, Vec<Player>)> {
        self.read_snapshot(session)
    }

    async fn load_available_players(&self, session: &str) -> Result<Vec<Player>> {
        self.read_snapshot(session).map(|(_, players)| players)
    }

    async fn get_draft_state(&self, session: &str) -> Result<DraftState> {
        let handle = self.session(session)?;
        let state = Self::lock(&handle).state.clone();
        Ok(state)
    }

    async fn record_pick(
        &self,
        session: &str,
        expected_pick: u32,
        player: PlayerId,
    ) -> Result<DraftPick> {
        self.submit_pick(session, expected_pick, player)
    }
}

/// Session id from the current UTC time plus a per-store sequence number.
pub fn generate_session_id(seq: u64) -> String {
    let now = chrono::Utc::now();
    format!("{}_{seq}", now.format("draft_%Y%m%d_%H%M%S_%3f"))
}

// ---------------------------------------------------------------------------
// Recommendation service
// ---------------------------------------------------------------------------

/// Runs rankings for stored sessions off the async executor.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn DraftStore>,
    ranker: Arc<Ranker>,
    model: Arc<dyn HazardModel>,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn DraftStore>, ranker: Ranker, model: Arc<dyn HazardModel>) -> Self {
        RecommendationService {
            store,
            ranker: Arc::new(ranker),
            model,
        }
    }

    /// Recommendations for the session's current pick, with hazards from
    /// the configured opponent model.
    pub async fn recommendations(&self, session: &str) -> Result<RecommendationResult> {
        let (state, players) = self.store.snapshot(session).await?;
        let ranker = Arc::clone(&self.ranker);
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || {
            ranker.recommend_with_model(&state, &players, model.as_ref())
        })
        .await
        .map_err(|e| DraftError::TaskFailed(e.to_string()))?
    }

    /// Recommendations with caller-supplied hazards for `horizon` picks.
    pub async fn recommendations_with_hazards(
        &self,
        session: &str,
        hazards: Vec<HazardMap>,
        horizon: u32,
    ) -> Result<RecommendationResult> {
        let (state, players) = self.store.snapshot(session).await?;
        let ranker = Arc::clone(&self.ranker);
        tokio::task::spawn_blocking(move || ranker.recommend(&state, &players, &hazards, horizon))
            .await
            .map_err(|e| DraftError::TaskFailed(e.to_string()))?
    }

    /// Live replacement levels over the session's remaining players.
    pub async fn replacement_levels(&self, session: &str) -> Result<ReplacementLevels> {
        let (state, players) = self.store.snapshot(session).await?;
        replacement_levels(&players, state.team_count, &state.lineup)
    }

    pub async fn record_pick(
        &self,
        session: &str,
        expected_pick: u32,
        player: PlayerId,
    ) -> Result<DraftPick> {
        self.store.record_pick(session, expected_pick, player).await
    }
}
