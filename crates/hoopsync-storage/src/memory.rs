use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hoopsync_core::{
    GameDetails, GameEvent, GameId, GameStatus, Official, Officiated, PlayerDetails, PlayerGame,
    Season, Shot, ShotDetail, ShotKey, Stats, StatsKey, StatsSubject, Team,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{Store, StoreError, StoreTxn};

/// Everything the in-memory store holds. Keyed the same way as the relational schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySnapshot {
    pub teams: BTreeMap<i64, Team>,
    pub players: BTreeMap<i64, PlayerDetails>,
    pub games: BTreeMap<GameId, GameDetails>,
    pub officials: BTreeMap<i64, Official>,
    pub officiated: BTreeSet<(GameId, i64)>,
    pub stats: BTreeMap<i64, Stats>,
    /// `(team_id, game_id) -> stats_id`
    pub team_game_stats: BTreeMap<(i64, GameId), i64>,
    /// `(player_id, game_id) -> (team_id, stats_id)`
    pub player_game_stats: BTreeMap<(i64, GameId), (i64, i64)>,
    pub shots: BTreeMap<ShotKey, Shot>,
    /// `(game_id, sequence) -> event`
    pub events: BTreeMap<(GameId, i32), GameEvent>,
    next_stats_id: i64,
}

/// In-process [`Store`] used by tests and dry runs.
///
/// A transaction holds the store lock for its whole lifetime and writes into a
/// staged copy that replaces the shared state only on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemorySnapshot>>,
    reject_stats: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> MemorySnapshot {
        self.state.lock().await.clone()
    }

    /// Make every subsequent stats insert fail, to exercise rollback paths.
    pub fn reject_stats_writes(&self, reject: bool) {
        self.reject_stats.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTxn>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTxn {
            guard,
            staged,
            reject_stats: self.reject_stats.load(Ordering::SeqCst),
        }))
    }

    async fn game_ids_with_status(&self, status: GameStatus) -> Result<Vec<GameId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .games
            .values()
            .filter(|game| game.status == status)
            .map(|game| game.id.clone())
            .collect())
    }

    async fn game_ids_for_season(&self, season: Season) -> Result<Vec<GameId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .games
            .values()
            .filter(|game| game.season == season)
            .map(|game| game.id.clone())
            .collect())
    }

    async fn player_games(&self, season: Season) -> Result<Vec<PlayerGame>, StoreError> {
        let state = self.state.lock().await;
        let mut found: Vec<PlayerGame> = state
            .player_game_stats
            .iter()
            .filter_map(|((player_id, game_id), (team_id, _))| {
                let game = state.games.get(game_id)?;
                (game.season == season).then(|| PlayerGame {
                    player_id: *player_id,
                    team_id: *team_id,
                    game_id: game_id.clone(),
                    season,
                })
            })
            .collect();
        found.sort_by(|a, b| (&a.game_id, a.player_id).cmp(&(&b.game_id, b.player_id)));
        Ok(found)
    }
}

struct MemoryTxn {
    guard: OwnedMutexGuard<MemorySnapshot>,
    staged: MemorySnapshot,
    reject_stats: bool,
}

#[async_trait]
impl StoreTxn for MemoryTxn {
    async fn upsert_team(&mut self, team: &Team) -> Result<(), StoreError> {
        self.staged.teams.insert(team.id, team.clone());
        Ok(())
    }

    async fn upsert_player(&mut self, player: &PlayerDetails) -> Result<(), StoreError> {
        self.staged.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn upsert_game(&mut self, game: &GameDetails) -> Result<(), StoreError> {
        self.staged.games.insert(game.id.clone(), game.clone());
        Ok(())
    }

    async fn upsert_official(&mut self, official: &Official) -> Result<(), StoreError> {
        self.staged.officials.insert(official.id, official.clone());
        Ok(())
    }

    async fn upsert_officiated(&mut self, link: &Officiated) -> Result<(), StoreError> {
        if !self.staged.games.contains_key(&link.game_id) {
            return Err(StoreError::Rejected(format!("unknown game {}", link.game_id)));
        }
        if !self.staged.officials.contains_key(&link.official_id) {
            return Err(StoreError::Rejected(format!(
                "unknown official {}",
                link.official_id
            )));
        }
        self.staged
            .officiated
            .insert((link.game_id.clone(), link.official_id));
        Ok(())
    }

    async fn find_stats_id(&mut self, key: &StatsKey) -> Result<Option<i64>, StoreError> {
        let found = match key.subject {
            StatsSubject::Team { team_id } => self
                .staged
                .team_game_stats
                .get(&(team_id, key.game_id.clone()))
                .copied(),
            StatsSubject::Player { player_id, .. } => self
                .staged
                .player_game_stats
                .get(&(player_id, key.game_id.clone()))
                .map(|(_, stats_id)| *stats_id),
        };
        Ok(found)
    }

    async fn insert_stats(&mut self, stats: &Stats) -> Result<i64, StoreError> {
        if self.reject_stats {
            return Err(StoreError::Rejected("stats writes are disabled".to_string()));
        }
        self.staged.next_stats_id += 1;
        let id = self.staged.next_stats_id;
        self.staged.stats.insert(id, stats.clone());
        Ok(id)
    }

    async fn update_stats(&mut self, stats_id: i64, stats: &Stats) -> Result<(), StoreError> {
        match self.staged.stats.get_mut(&stats_id) {
            Some(existing) => {
                *existing = stats.clone();
                Ok(())
            }
            None => Err(StoreError::Rejected(format!(
                "stats row {stats_id} does not exist"
            ))),
        }
    }

    async fn insert_stats_link(&mut self, key: &StatsKey, stats_id: i64) -> Result<(), StoreError> {
        if !self.staged.stats.contains_key(&stats_id) {
            return Err(StoreError::Rejected(format!(
                "stats row {stats_id} does not exist"
            )));
        }
        let duplicate = match key.subject {
            StatsSubject::Team { team_id } => self
                .staged
                .team_game_stats
                .insert((team_id, key.game_id.clone()), stats_id)
                .is_some(),
            StatsSubject::Player { player_id, team_id } => self
                .staged
                .player_game_stats
                .insert((player_id, key.game_id.clone()), (team_id, stats_id))
                .is_some(),
        };
        if duplicate {
            return Err(StoreError::Rejected(format!(
                "stats already linked for subject {} in game {}",
                key.subject.subject_id(),
                key.game_id
            )));
        }
        Ok(())
    }

    async fn upsert_shot(&mut self, shot: &Shot) -> Result<(), StoreError> {
        let key = shot.key();
        let detail = self
            .staged
            .shots
            .get(&key)
            .and_then(|existing| existing.detail.clone());
        self.staged.shots.insert(
            key,
            Shot {
                detail,
                ..shot.clone()
            },
        );
        Ok(())
    }

    async fn update_shot_detail(
        &mut self,
        key: &ShotKey,
        detail: &ShotDetail,
    ) -> Result<bool, StoreError> {
        match self.staged.shots.get_mut(key) {
            Some(shot) => {
                shot.detail = Some(detail.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert_event(&mut self, event: &GameEvent) -> Result<(), StoreError> {
        self.staged
            .events
            .insert((event.game_id.clone(), event.sequence), event.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTxn {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}
