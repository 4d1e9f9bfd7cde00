use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use hoopsync_adapters::StatsApi;
use hoopsync_core::{
    GameId, GameStatus, Official, Officiated, Player, PlayerGame, Season, SeasonType, ShotKey,
    Stats, StatsKey, StatsSubject,
};
use hoopsync_storage::{Store, StoreError, StoreTxn};
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{AggregateError, FanOutPolicy, SyncError, Throttler};

/// Default cap on concurrent upstream requests per fan-out.
pub const MAX_CONCURRENT_REQUESTS: usize = 10;

/// Outcome of one sync operation. Per-entity failures land in `failures`;
/// only prerequisite failures turn the whole operation into an `Err`.
#[derive(Debug)]
pub struct SyncReport {
    pub entity: &'static str,
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failures: Option<AggregateError>,
}

impl SyncReport {
    fn empty(entity: &'static str) -> Self {
        Self {
            entity,
            attempted: 0,
            succeeded: 0,
            skipped: 0,
            failures: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_none() && self.skipped == 0
    }

    pub fn failed(&self) -> usize {
        self.failures.as_ref().map_or(0, AggregateError::len)
    }
}

/// Mirrors upstream entities into a [`Store`].
#[derive(Clone)]
pub struct Syncer {
    api: StatsApi,
    store: Arc<dyn Store>,
    concurrency: usize,
    fan_out: FanOutPolicy,
    roster_season: Season,
}

impl std::fmt::Debug for Syncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Syncer")
            .field("concurrency", &self.concurrency)
            .field("fan_out", &self.fan_out)
            .field("roster_season", &self.roster_season)
            .finish_non_exhaustive()
    }
}

impl Syncer {
    pub fn new(api: StatsApi, store: Arc<dyn Store>) -> Self {
        Self {
            api,
            store,
            concurrency: MAX_CONCURRENT_REQUESTS,
            fan_out: FanOutPolicy::CollectAll,
            roster_season: Season::current(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Policy for per-entity fan-outs. Discovery is always fail-fast.
    pub fn with_fan_out(mut self, fan_out: FanOutPolicy) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Season used to list historical players.
    pub fn with_roster_season(mut self, season: Season) -> Self {
        self.roster_season = season;
        self
    }

    pub fn api(&self) -> &StatsApi {
        &self.api
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Replace every franchise in a single transaction.
    pub async fn sync_teams(&self) -> Result<SyncReport, SyncError> {
        let span = info_span!("sync", run_id = %Uuid::new_v4(), entity = "teams");
        async {
            let teams = self.api.teams().await?;
            let mut txn = self.store.begin().await?;
            for team in &teams {
                txn.upsert_team(team).await?;
            }
            txn.commit().await?;
            info!(teams = teams.len(), "teams synced");
            Ok::<_, SyncError>(SyncReport {
                attempted: teams.len(),
                succeeded: teams.len(),
                ..SyncReport::empty("teams")
            })
        }
        .instrument(span)
        .await
    }

    /// Fetch and store details for every historical player.
    pub async fn sync_players(&self) -> Result<SyncReport, SyncError> {
        let span = info_span!("sync", run_id = %Uuid::new_v4(), entity = "players");
        async {
            let roster = self.api.historical_players(self.roster_season).await?;
            info!(players = roster.len(), season = %self.roster_season, "roster fetched");

            let mut throttler = Throttler::with_policy(self.concurrency, self.fan_out);
            for player in roster {
                let api = self.api.clone();
                let store = Arc::clone(&self.store);
                throttler
                    .run(async move {
                        let result = async {
                            let details = api.player_details(player.id).await?;
                            let mut txn = store.begin().await?;
                            txn.upsert_player(&details).await?;
                            txn.commit().await?;
                            Ok::<_, SyncError>(())
                        }
                        .await;
                        match result {
                            Ok(()) => {
                                debug!(player_id = player.id, "player synced");
                                Ok(())
                            }
                            Err(err) => {
                                warn!(player_id = player.id, error = %err, "player sync failed");
                                Err(SyncError::for_entity("player", player.id, err))
                            }
                        }
                    })
                    .await;
            }
            Ok::<_, SyncError>(finish("players", &mut throttler).await)
        }
        .instrument(span)
        .await
    }

    /// Every game id played by any team in `season`, regular season and
    /// playoffs, deduplicated and sorted. Any failure aborts discovery.
    pub async fn discover_game_ids(&self, season: Season) -> Result<Vec<GameId>, SyncError> {
        let span = info_span!("sync", run_id = %Uuid::new_v4(), entity = "game_ids");
        self.discover(season).instrument(span).await
    }

    /// Fetch and store each game. Duplicate ids are synced once.
    pub async fn sync_games(&self, ids: &[GameId]) -> Result<SyncReport, SyncError> {
        let span = info_span!("sync", run_id = %Uuid::new_v4(), entity = "games");
        self.store_games(ids).instrument(span).await
    }

    /// Discover every game of `season` and sync all of them under one run.
    pub async fn sync_all_games(&self, season: Season) -> Result<SyncReport, SyncError> {
        let span = info_span!("sync", run_id = %Uuid::new_v4(), entity = "all_games", %season);
        async {
            let ids = self.discover(season).await?;
            self.store_games(&ids).await
        }
        .instrument(span)
        .await
    }

    /// Sync only games of `season` that are not stored yet.
    pub async fn sync_new_games(&self, season: Season) -> Result<SyncReport, SyncError> {
        let span = info_span!("sync", run_id = %Uuid::new_v4(), entity = "new_games", %season);
        async {
            let discovered = self.discover(season).await?;
            let known: HashSet<GameId> = self
                .store
                .game_ids_for_season(season)
                .await?
                .into_iter()
                .collect();
            let fresh: Vec<GameId> = discovered
                .into_iter()
                .filter(|id| !known.contains(id))
                .collect();
            info!(new_games = fresh.len(), "new games found");
            self.store_games(&fresh).await
        }
        .instrument(span)
        .await
    }

    /// Refresh the stored games that currently have `status`.
    pub async fn sync_games_with_status(
        &self,
        status: GameStatus,
    ) -> Result<SyncReport, SyncError> {
        let span = info_span!("sync", run_id = %Uuid::new_v4(), entity = "games", ?status);
        async {
            let ids = self.store.game_ids_with_status(status).await?;
            debug!(games = ids.len(), "refreshing games by status");
            self.store_games(&ids).await
        }
        .instrument(span)
        .await
    }

    /// Replace the shot log of every player active in `season`, one
    /// transaction per player.
    pub async fn sync_shots(&self, season: Season) -> Result<SyncReport, SyncError> {
        let span = info_span!("sync", run_id = %Uuid::new_v4(), entity = "shots", %season);
        async {
            let roster = self.api.historical_players(season).await?;
            let players: Vec<i64> = roster
                .iter()
                .filter(|player| played_in(player, season))
                .map(|player| player.id)
                .collect();
            info!(players = players.len(), "fetching shot logs");

            let mut throttler = Throttler::with_policy(self.concurrency, self.fan_out);
            for player_id in players {
                let api = self.api.clone();
                let store = Arc::clone(&self.store);
                throttler
                    .run(async move {
                        let result = async {
                            let mut shots = Vec::new();
                            for season_type in SeasonType::ALL {
                                shots.extend(api.player_shots(player_id, season, season_type).await?);
                            }
                            let mut txn = store.begin().await?;
                            for shot in &shots {
                                txn.upsert_shot(shot).await?;
                            }
                            txn.commit().await?;
                            Ok::<_, SyncError>(shots.len())
                        }
                        .await;
                        match result {
                            Ok(count) => {
                                debug!(player_id, shots = count, "shots synced");
                                Ok(())
                            }
                            Err(err) => {
                                warn!(player_id, error = %err, "shot sync failed");
                                Err(SyncError::for_entity("player", player_id, err))
                            }
                        }
                    })
                    .await;
            }
            Ok::<_, SyncError>(finish("shots", &mut throttler).await)
        }
        .instrument(span)
        .await
    }

    /// Attach court locations to stored shots, one shot chart per stored
    /// player appearance in `season`. Run after games and shots are synced.
    pub async fn sync_shot_details(&self, season: Season) -> Result<SyncReport, SyncError> {
        let span = info_span!("sync", run_id = %Uuid::new_v4(), entity = "shot_details", %season);
        async {
            let appearances = self.store.player_games(season).await?;
            info!(appearances = appearances.len(), "fetching shot charts");

            let mut throttler = Throttler::with_policy(self.concurrency, self.fan_out);
            for appearance in appearances {
                let api = self.api.clone();
                let store = Arc::clone(&self.store);
                throttler
                    .run(async move {
                        match sync_shot_chart(&api, store.as_ref(), &appearance).await {
                            Ok(()) => Ok(()),
                            Err(err) => {
                                warn!(
                                    player_id = appearance.player_id,
                                    game_id = %appearance.game_id,
                                    error = %err,
                                    "shot chart sync failed"
                                );
                                let id = format!("{} in {}", appearance.player_id, appearance.game_id);
                                Err(SyncError::for_entity("player", id, err))
                            }
                        }
                    })
                    .await;
            }
            Ok::<_, SyncError>(finish("shot_details", &mut throttler).await)
        }
        .instrument(span)
        .await
    }

    /// Replace the play-by-play of each game, one transaction per game.
    pub async fn sync_game_events(
        &self,
        season: Season,
        ids: &[GameId],
    ) -> Result<SyncReport, SyncError> {
        let span = info_span!("sync", run_id = %Uuid::new_v4(), entity = "events", %season);
        async {
            let unique: BTreeSet<&GameId> = ids.iter().collect();
            info!(games = unique.len(), "fetching play-by-play");

            let mut throttler = Throttler::with_policy(self.concurrency, self.fan_out);
            for id in unique {
                let api = self.api.clone();
                let store = Arc::clone(&self.store);
                let id = id.clone();
                throttler
                    .run(async move {
                        let result = async {
                            let events = api.play_by_play(&id, season).await?;
                            let mut txn = store.begin().await?;
                            for event in &events {
                                txn.upsert_event(event).await?;
                            }
                            txn.commit().await?;
                            Ok::<_, SyncError>(events.len())
                        }
                        .await;
                        match result {
                            Ok(count) => {
                                debug!(game_id = %id, events = count, "events synced");
                                Ok(())
                            }
                            Err(err) => {
                                warn!(game_id = %id, error = %err, "event sync failed");
                                Err(SyncError::for_entity("game", id, err))
                            }
                        }
                    })
                    .await;
            }
            Ok::<_, SyncError>(finish("events", &mut throttler).await)
        }
        .instrument(span)
        .await
    }

    /// Play-by-play for every stored game of `season`.
    pub async fn sync_season_events(&self, season: Season) -> Result<SyncReport, SyncError> {
        let ids = self.store.game_ids_for_season(season).await?;
        self.sync_game_events(season, &ids).await
    }

    async fn discover(&self, season: Season) -> Result<Vec<GameId>, SyncError> {
        let teams = self.api.teams().await?;
        let found: Arc<Mutex<HashSet<GameId>>> = Arc::default();

        let mut throttler = Throttler::with_policy(self.concurrency, FanOutPolicy::FailFast);
        for team in &teams {
            for season_type in SeasonType::ALL {
                let api = self.api.clone();
                let found = Arc::clone(&found);
                let team_id = team.id;
                let label = format!("{} {}", team.city, team.name);
                throttler
                    .run(async move {
                        let ids = api
                            .games_played_by(team_id, season, season_type)
                            .await
                            .map_err(|err| SyncError::for_entity("team", team_id, err))?;
                        debug!(team = %label, season_type = season_type.as_param(), games = ids.len(), "game log read");
                        found.lock().await.extend(ids);
                        Ok(())
                    })
                    .await;
            }
        }
        throttler.wait().await?;

        let mut ids: Vec<GameId> = found.lock().await.drain().collect();
        ids.sort();
        info!(%season, teams = teams.len(), games = ids.len(), "game ids discovered");
        Ok(ids)
    }

    async fn store_games(&self, ids: &[GameId]) -> Result<SyncReport, SyncError> {
        let unique: BTreeSet<&GameId> = ids.iter().collect();
        info!(games = unique.len(), "syncing games");

        let mut throttler = Throttler::with_policy(self.concurrency, self.fan_out);
        for id in unique {
            let api = self.api.clone();
            let store = Arc::clone(&self.store);
            let id = id.clone();
            throttler
                .run(async move {
                    match sync_game(&api, store.as_ref(), &id).await {
                        Ok(()) => {
                            debug!(game_id = %id, "game synced");
                            Ok(())
                        }
                        Err(err) => {
                            warn!(game_id = %id, error = %err, "game sync failed");
                            Err(SyncError::for_entity("game", id, err))
                        }
                    }
                })
                .await;
        }
        Ok(finish("games", &mut throttler).await)
    }
}

/// Career bounds from the roster are fall years; unreadable bounds do not exclude.
fn played_in(player: &Player, season: Season) -> bool {
    let year = |raw: &str| raw.trim().parse::<i32>().ok();
    let fall = season.fall_year();
    year(&player.career_start_year).map_or(true, |from| from <= fall)
        && year(&player.career_end_year).map_or(true, |to| to >= fall)
}

async fn finish(entity: &'static str, throttler: &mut Throttler) -> SyncReport {
    let failures = throttler.wait().await.err();
    let stats = throttler.stats();
    let report = SyncReport {
        entity,
        attempted: stats.submitted,
        succeeded: stats.succeeded,
        skipped: stats.skipped,
        failures,
    };
    if report.failures.is_some() {
        warn!(
            entity,
            attempted = report.attempted,
            failed = report.failed(),
            skipped = report.skipped,
            "sync finished with failures"
        );
    } else {
        info!(entity, synced = report.succeeded, "sync finished");
    }
    report
}

/// Fetch everything for one game, then write it in one transaction.
async fn sync_game(api: &StatsApi, store: &dyn Store, id: &GameId) -> Result<(), SyncError> {
    let summary = api.game_summary(id).await?;
    let box_score = if summary.game.status.is_final() {
        Some(api.box_score(id).await?)
    } else {
        None
    };

    let mut txn = store.begin().await?;
    txn.upsert_game(&summary.game).await?;
    for official in officials_in_lock_order(&summary.officials) {
        txn.upsert_official(official).await?;
        txn.upsert_officiated(&Officiated {
            game_id: id.clone(),
            official_id: official.id,
        })
        .await?;
    }

    if let Some(box_score) = box_score {
        for team in &box_score.team_stats {
            let key = StatsKey {
                subject: StatsSubject::Team {
                    team_id: team.team_id,
                },
                game_id: id.clone(),
            };
            record_stats(txn.as_mut(), &key, &team.stats).await?;
        }
        for player in &box_score.player_stats {
            let key = StatsKey {
                subject: StatsSubject::Player {
                    player_id: player.player_id,
                    team_id: player.team_id,
                },
                game_id: id.clone(),
            };
            record_stats(txn.as_mut(), &key, &player.stats).await?;
        }
    }

    txn.commit().await?;
    Ok(())
}

/// Officials sorted by id with repeats dropped. Concurrent game writes that
/// share officials then take their row locks in the same order.
fn officials_in_lock_order(officials: &[Official]) -> Vec<&Official> {
    let mut ordered: Vec<&Official> = officials.iter().collect();
    ordered.sort_by_key(|official| official.id);
    ordered.dedup_by_key(|official| official.id);
    ordered
}

/// Match shot-chart rows to stored shots by their position in the game and
/// write them in one transaction.
async fn sync_shot_chart(
    api: &StatsApi,
    store: &dyn Store,
    appearance: &PlayerGame,
) -> Result<(), SyncError> {
    let details = api.shot_chart(appearance).await?;

    let mut txn = store.begin().await?;
    let mut unmatched = 0usize;
    for (index, detail) in details.iter().enumerate() {
        let key = ShotKey {
            game_id: appearance.game_id.clone(),
            player_id: appearance.player_id,
            number: i32::try_from(index + 1).unwrap_or(i32::MAX),
        };
        if !txn.update_shot_detail(&key, detail).await? {
            unmatched += 1;
        }
    }
    txn.commit().await?;

    if unmatched > 0 {
        warn!(
            player_id = appearance.player_id,
            game_id = %appearance.game_id,
            charted = details.len(),
            unmatched,
            "shot chart has attempts missing from the shot log"
        );
    } else {
        debug!(player_id = appearance.player_id, game_id = %appearance.game_id, shots = details.len(), "shot chart synced");
    }
    Ok(())
}

/// Update the stat line already associated with `key` in place, or insert a
/// new one together with its association.
async fn record_stats(
    txn: &mut dyn StoreTxn,
    key: &StatsKey,
    stats: &Stats,
) -> Result<i64, StoreError> {
    match txn.find_stats_id(key).await? {
        Some(stats_id) => {
            txn.update_stats(stats_id, stats).await?;
            Ok(stats_id)
        }
        None => {
            let stats_id = txn.insert_stats(stats).await?;
            txn.insert_stats_link(key, stats_id).await?;
            Ok(stats_id)
        }
    }
}
