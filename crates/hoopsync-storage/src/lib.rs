//! HTTP transport and persistence capabilities for hoopsync.

mod http;
mod memory;
mod postgres;

use async_trait::async_trait;
use hoopsync_core::{
    GameDetails, GameEvent, GameId, GameStatus, Official, Officiated, PlayerDetails, PlayerGame,
    Season, Shot, ShotDetail, ShotKey, Stats, StatsKey, Team,
};
use thiserror::Error;

pub use http::{
    classify_reqwest_error, classify_response, parse_retry_after, BackoffPolicy, FetchError,
    FetchedResponse, HttpClientConfig, HttpFetcher, RetryDisposition,
};
pub use memory::{MemorySnapshot, MemoryStore};
pub use postgres::PgStore;

pub const CRATE_NAME: &str = "hoopsync-storage";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("stored value is invalid: {0}")]
    InvalidValue(String),
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// A relational store that mirrors upstream entities.
///
/// Writes go through [`StoreTxn`]; reads used for targeted refreshes are
/// answered directly.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTxn>, StoreError>;

    async fn game_ids_with_status(&self, status: GameStatus) -> Result<Vec<GameId>, StoreError>;

    async fn game_ids_for_season(&self, season: Season) -> Result<Vec<GameId>, StoreError>;

    /// Every player appearance with stored stats in `season`, ordered by game then player.
    async fn player_games(&self, season: Season) -> Result<Vec<PlayerGame>, StoreError>;
}

/// One atomic unit of writes. Dropping it without [`StoreTxn::commit`] discards
/// everything written through it.
#[async_trait]
pub trait StoreTxn: Send {
    /// Insert or replace by team id.
    async fn upsert_team(&mut self, team: &Team) -> Result<(), StoreError>;

    async fn upsert_player(&mut self, player: &PlayerDetails) -> Result<(), StoreError>;

    async fn upsert_game(&mut self, game: &GameDetails) -> Result<(), StoreError>;

    async fn upsert_official(&mut self, official: &Official) -> Result<(), StoreError>;

    async fn upsert_officiated(&mut self, link: &Officiated) -> Result<(), StoreError>;

    /// Look up the stats row already associated with `(subject, game)`.
    async fn find_stats_id(&mut self, key: &StatsKey) -> Result<Option<i64>, StoreError>;

    /// Insert a new stats row and return its durable id.
    async fn insert_stats(&mut self, stats: &Stats) -> Result<i64, StoreError>;

    async fn update_stats(&mut self, stats_id: i64, stats: &Stats) -> Result<(), StoreError>;

    async fn insert_stats_link(&mut self, key: &StatsKey, stats_id: i64) -> Result<(), StoreError>;

    /// Insert or replace the shot-log fields of one attempt. Shot-chart fields are kept.
    async fn upsert_shot(&mut self, shot: &Shot) -> Result<(), StoreError>;

    /// Attach shot-chart attributes to a stored attempt. Returns `false` when no
    /// attempt matches `key`.
    async fn update_shot_detail(
        &mut self,
        key: &ShotKey,
        detail: &ShotDetail,
    ) -> Result<bool, StoreError>;

    async fn upsert_event(&mut self, event: &GameEvent) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
