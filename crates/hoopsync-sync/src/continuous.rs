//! Long-running refresh loop: five cadences, one action at a time.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use hoopsync_core::{GameStatus, Season};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{error, info};

use crate::{SyncError, SyncReport, Syncer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshAction {
    AllGames,
    Teams,
    NewGames,
    LiveGames,
    ScheduledGames,
}

impl RefreshAction {
    pub const ALL: [RefreshAction; 5] = [
        RefreshAction::AllGames,
        RefreshAction::Teams,
        RefreshAction::NewGames,
        RefreshAction::LiveGames,
        RefreshAction::ScheduledGames,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AllGames => "all_games",
            Self::Teams => "teams",
            Self::NewGames => "new_games",
            Self::LiveGames => "live_games",
            Self::ScheduledGames => "scheduled_games",
        }
    }
}

impl fmt::Display for RefreshAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How often each [`RefreshAction`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub all_games: Duration,
    pub teams: Duration,
    pub new_games: Duration,
    pub live_games: Duration,
    pub scheduled_games: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            all_games: Duration::from_secs(72 * 60 * 60),
            teams: Duration::from_secs(6 * 60 * 60),
            new_games: Duration::from_secs(60 * 60),
            live_games: Duration::from_secs(3 * 60),
            scheduled_games: Duration::from_secs(15 * 60),
        }
    }
}

impl Cadence {
    /// Same period for every action.
    pub fn uniform(period: Duration) -> Self {
        Self {
            all_games: period,
            teams: period,
            new_games: period,
            live_games: period,
            scheduled_games: period,
        }
    }

    pub fn period(&self, action: RefreshAction) -> Duration {
        let period = match action {
            RefreshAction::AllGames => self.all_games,
            RefreshAction::Teams => self.teams,
            RefreshAction::NewGames => self.new_games,
            RefreshAction::LiveGames => self.live_games,
            RefreshAction::ScheduledGames => self.scheduled_games,
        };
        // tokio panics on a zero period.
        period.max(Duration::from_millis(1))
    }

    fn interval(&self, action: RefreshAction, start: Instant) -> Interval {
        let period = self.period(action);
        let mut interval = interval_at(start + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }
}

/// Receives failures from scheduled refreshes. The loop keeps going either way.
pub trait ErrorSink: Send + Sync {
    fn report(&self, action: RefreshAction, err: &SyncError);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ErrorSink for NoopSink {
    fn report(&self, _action: RefreshAction, _err: &SyncError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&self, action: RefreshAction, err: &SyncError) {
        error!(action = action.name(), error = %err, "scheduled refresh failed");
    }
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Runs [`RefreshAction`]s on their cadences. Unless a season is pinned, each
/// refresh targets the season containing the day it runs.
#[derive(Clone)]
pub struct Continuous {
    syncer: Syncer,
    season: Option<Season>,
    cadence: Cadence,
    sink: Arc<dyn ErrorSink>,
    clock: Clock,
}

impl fmt::Debug for Continuous {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuous")
            .field("syncer", &self.syncer)
            .field("pinned_season", &self.season)
            .field("cadence", &self.cadence)
            .finish_non_exhaustive()
    }
}

impl Continuous {
    pub fn new(syncer: Syncer) -> Self {
        Self {
            syncer,
            season: None,
            cadence: Cadence::default(),
            sink: Arc::new(NoopSink),
            clock: Arc::new(|| Utc::now().date_naive()),
        }
    }

    pub fn with_season(mut self, season: Season) -> Self {
        self.season = Some(season);
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    pub fn season_on(&self, date: NaiveDate) -> Season {
        self.season.unwrap_or_else(|| Season::containing(date))
    }

    pub fn current_season(&self) -> Season {
        self.season_on((self.clock)())
    }

    pub async fn run_action(&self, action: RefreshAction) -> Result<SyncReport, SyncError> {
        match action {
            RefreshAction::AllGames => self.syncer.sync_all_games(self.current_season()).await,
            RefreshAction::Teams => self.syncer.sync_teams().await,
            RefreshAction::NewGames => self.syncer.sync_new_games(self.current_season()).await,
            RefreshAction::LiveGames => self.syncer.sync_games_with_status(GameStatus::Live).await,
            RefreshAction::ScheduledGames => {
                self.syncer
                    .sync_games_with_status(GameStatus::Scheduled)
                    .await
            }
        }
    }

    /// Refresh forever.
    pub async fn run(&self) {
        self.run_until(std::future::pending()).await;
    }

    /// Refresh until `shutdown` resolves. An action in progress is finished
    /// first. Returns the number of actions run.
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        let mut all_games = self.cadence.interval(RefreshAction::AllGames, start);
        let mut teams = self.cadence.interval(RefreshAction::Teams, start);
        let mut new_games = self.cadence.interval(RefreshAction::NewGames, start);
        let mut live_games = self.cadence.interval(RefreshAction::LiveGames, start);
        let mut scheduled_games = self.cadence.interval(RefreshAction::ScheduledGames, start);
        tokio::pin!(shutdown);

        info!(pinned_season = ?self.season, cadence = ?self.cadence, "continuous sync started");
        let mut ran = 0;
        loop {
            let action = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = all_games.tick() => RefreshAction::AllGames,
                _ = teams.tick() => RefreshAction::Teams,
                _ = new_games.tick() => RefreshAction::NewGames,
                _ = live_games.tick() => RefreshAction::LiveGames,
                _ = scheduled_games.tick() => RefreshAction::ScheduledGames,
            };
            self.tick(action).await;
            ran += 1;
        }
        info!(actions = ran, "continuous sync stopped");
        ran
    }

    async fn tick(&self, action: RefreshAction) {
        match self.run_action(action).await {
            Ok(report) => {
                if let Some(failures) = report.failures {
                    self.sink.report(action, &SyncError::Aggregate(failures));
                }
            }
            Err(err) => self.sink.report(action, &err),
        }
    }
}
