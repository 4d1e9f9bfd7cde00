use async_trait::async_trait;
use hoopsync_core::{
    GameDetails, GameEvent, GameId, GameStatus, Official, Officiated, PlayerDetails, PlayerGame,
    RosterStatus, Season, Shot, ShotDetail, ShotKey, Stats, StatsKey, StatsSubject, Team,
};
use once_cell::sync::Lazy;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::info;

use crate::{Store, StoreError, StoreTxn};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

const TEAM_COLUMNS: &[&str] = &[
    "id",
    "city",
    "name",
    "start_year",
    "end_year",
    "games",
    "wins",
    "losses",
    "win_percentage",
    "playoff_appearances",
    "division_titles",
    "conference_titles",
    "league_titles",
];

const PLAYER_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "birthdate",
    "school",
    "country",
    "height_inches",
    "weight_pounds",
    "season_experience",
    "jersey",
    "position",
    "roster_status",
    "team_id",
    "team_name",
    "team_abbreviation",
    "team_city",
    "career_start_year",
    "career_end_year",
    "dleague",
];

const GAME_COLUMNS: &[&str] = &[
    "id",
    "season",
    "status",
    "game_date",
    "home_team_id",
    "visitor_team_id",
    "home_points",
    "visitor_points",
    "attendance",
    "length_minutes",
    "last_meeting_game_id",
    "national_tv",
    "playoffs",
];

const OFFICIAL_COLUMNS: &[&str] = &["id", "first_name", "last_name", "jersey_number"];

// Shot-chart columns are left out; only `update_shot_detail` writes them.
const SHOT_COLUMNS: &[&str] = &[
    "game_id",
    "player_id",
    "shot_number",
    "made",
    "points",
    "home",
    "period",
    "game_clock_seconds",
    "shot_clock",
    "dribbles",
    "touch_time_seconds",
    "distance_feet",
    "points_type",
    "closest_defender_player_id",
    "closest_defender_distance",
];

const EVENT_COLUMNS: &[&str] = &[
    "game_id",
    "seq",
    "event_type",
    "period",
    "score_home",
    "score_visitor",
    "period_time_seconds",
    "wall_clock",
    "player1_id",
    "player2_id",
    "player3_id",
    "home_description",
    "neutral_description",
    "visitor_description",
];

static UPSERT_TEAM: Lazy<String> = Lazy::new(|| upsert_sql("teams", &["id"], TEAM_COLUMNS, true));
static UPSERT_PLAYER: Lazy<String> =
    Lazy::new(|| upsert_sql("players", &["id"], PLAYER_COLUMNS, true));
static UPSERT_GAME: Lazy<String> = Lazy::new(|| upsert_sql("games", &["id"], GAME_COLUMNS, true));
static UPSERT_OFFICIAL: Lazy<String> =
    Lazy::new(|| upsert_sql("officials", &["id"], OFFICIAL_COLUMNS, false));
static UPSERT_SHOT: Lazy<String> = Lazy::new(|| {
    upsert_sql(
        "shots",
        &["game_id", "player_id", "shot_number"],
        SHOT_COLUMNS,
        false,
    )
});
static UPSERT_EVENT: Lazy<String> =
    Lazy::new(|| upsert_sql("game_events", &["game_id", "seq"], EVENT_COLUMNS, false));

/// `INSERT ... ON CONFLICT DO UPDATE` that only rewrites a row when some
/// non-key column actually differs, so re-syncing unchanged data leaves the
/// row (and `updated_at`) untouched.
fn upsert_sql(table: &str, key: &[&str], columns: &[&str], touch_updated_at: bool) -> String {
    let placeholders = (1..=columns.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let changing: Vec<&str> = columns
        .iter()
        .copied()
        .filter(|column| !key.contains(column))
        .collect();

    let mut assignments: Vec<String> = changing
        .iter()
        .map(|column| format!("{column} = EXCLUDED.{column}"))
        .collect();
    if touch_updated_at {
        assignments.push("updated_at = NOW()".to_string());
    }
    let current = changing
        .iter()
        .map(|column| format!("{table}.{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    let incoming = changing
        .iter()
        .map(|column| format!("EXCLUDED.{column}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders}) \
         ON CONFLICT ({}) DO UPDATE SET {} \
         WHERE ({current}) IS DISTINCT FROM ({incoming})",
        columns.join(", "),
        key.join(", "),
        assignments.join(", "),
    )
}

/// Postgres-backed [`Store`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR.run(&self.pool).await?;
        info!("migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTxn>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTxn { tx }))
    }

    async fn game_ids_with_status(&self, status: GameStatus) -> Result<Vec<GameId>, StoreError> {
        let rows = sqlx::query("SELECT id FROM games WHERE status = $1 ORDER BY id")
            .bind(status.id())
            .fetch_all(&self.pool)
            .await?;
        collect_game_ids(rows)
    }

    async fn game_ids_for_season(&self, season: Season) -> Result<Vec<GameId>, StoreError> {
        let rows = sqlx::query("SELECT id FROM games WHERE season = $1 ORDER BY id")
            .bind(season.to_string())
            .fetch_all(&self.pool)
            .await?;
        collect_game_ids(rows)
    }

    async fn player_games(&self, season: Season) -> Result<Vec<PlayerGame>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT pgs.player_id, pgs.team_id, pgs.game_id, g.season
            FROM player_game_stats pgs
            JOIN games g ON g.id = pgs.game_id
            WHERE g.season = $1
            ORDER BY pgs.game_id, pgs.player_id
            "#,
        )
        .bind(season.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<PlayerGame, StoreError> {
                let season: String = row.try_get("season")?;
                Ok(PlayerGame {
                    player_id: row.try_get("player_id")?,
                    team_id: row.try_get("team_id")?,
                    game_id: GameId::from(row.try_get::<String, _>("game_id")?),
                    season: season
                        .parse()
                        .map_err(|err| StoreError::InvalidValue(format!("{err}")))?,
                })
            })
            .collect()
    }
}

fn collect_game_ids(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<GameId>, StoreError> {
    rows.into_iter()
        .map(|row| row.try_get::<String, _>("id").map(GameId::from))
        .collect::<Result<_, _>>()
        .map_err(StoreError::from)
}

fn roster_status_code(status: RosterStatus) -> i16 {
    match status {
        RosterStatus::Inactive => 0,
        RosterStatus::Active => 1,
    }
}

struct PgTxn {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTxn for PgTxn {
    async fn upsert_team(&mut self, team: &Team) -> Result<(), StoreError> {
        sqlx::query(UPSERT_TEAM.as_str())
            .bind(team.id)
            .bind(&team.city)
            .bind(&team.name)
            .bind(&team.start_year)
            .bind(&team.end_year)
            .bind(team.games)
            .bind(team.wins)
            .bind(team.losses)
            .bind(team.win_percentage)
            .bind(team.playoff_appearances)
            .bind(team.division_titles)
            .bind(team.conference_titles)
            .bind(team.league_titles)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn upsert_player(&mut self, player: &PlayerDetails) -> Result<(), StoreError> {
        sqlx::query(UPSERT_PLAYER.as_str())
            .bind(player.id)
            .bind(&player.first_name)
            .bind(&player.last_name)
            .bind(player.birthdate)
            .bind(&player.school)
            .bind(&player.country)
            .bind(player.height_inches)
            .bind(player.weight_pounds)
            .bind(player.season_experience)
            .bind(&player.jersey)
            .bind(&player.position)
            .bind(roster_status_code(player.roster_status))
            .bind(player.team_id)
            .bind(&player.team_name)
            .bind(&player.team_abbreviation)
            .bind(&player.team_city)
            .bind(player.career_start_year)
            .bind(player.career_end_year)
            .bind(player.dleague)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn upsert_game(&mut self, game: &GameDetails) -> Result<(), StoreError> {
        sqlx::query(UPSERT_GAME.as_str())
            .bind(game.id.as_str())
            .bind(game.season.to_string())
            .bind(game.status.id())
            .bind(game.date)
            .bind(game.home_team_id)
            .bind(game.visitor_team_id)
            .bind(game.home_points)
            .bind(game.visitor_points)
            .bind(game.attendance)
            .bind(game.length_minutes)
            .bind(game.last_meeting_game_id.as_ref().map(GameId::as_str))
            .bind(&game.national_tv)
            .bind(game.playoffs)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn upsert_official(&mut self, official: &Official) -> Result<(), StoreError> {
        sqlx::query(UPSERT_OFFICIAL.as_str())
            .bind(official.id)
            .bind(&official.first_name)
            .bind(&official.last_name)
            .bind(&official.jersey_number)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn upsert_officiated(&mut self, link: &Officiated) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO officiated (game_id, official_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(link.game_id.as_str())
        .bind(link.official_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn find_stats_id(&mut self, key: &StatsKey) -> Result<Option<i64>, StoreError> {
        let row = match key.subject {
            StatsSubject::Team { team_id } => {
                sqlx::query("SELECT stats_id FROM team_game_stats WHERE team_id = $1 AND game_id = $2")
                    .bind(team_id)
                    .bind(key.game_id.as_str())
                    .fetch_optional(&mut *self.tx)
                    .await?
            }
            StatsSubject::Player { player_id, .. } => {
                sqlx::query(
                    "SELECT stats_id FROM player_game_stats WHERE player_id = $1 AND game_id = $2",
                )
                .bind(player_id)
                .bind(key.game_id.as_str())
                .fetch_optional(&mut *self.tx)
                .await?
            }
        };

        match row {
            Some(row) => Ok(Some(row.try_get("stats_id")?)),
            None => Ok(None),
        }
    }

    async fn insert_stats(&mut self, stats: &Stats) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO stats (
              seconds_played, field_goals_made, field_goals_attempted, field_goal_percentage,
              three_pointers_made, three_pointers_attempted, three_point_percentage,
              free_throws_made, free_throws_attempted, free_throw_percentage,
              offensive_rebounds, defensive_rebounds, rebounds, assists, steals, blocks,
              turnovers, personal_fouls, points, plus_minus
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING id
            "#,
        );
        let row = bind_stats(row, stats).fetch_one(&mut *self.tx).await?;
        Ok(row.try_get("id")?)
    }

    async fn update_stats(&mut self, stats_id: i64, stats: &Stats) -> Result<(), StoreError> {
        let query = sqlx::query(
            r#"
            UPDATE stats SET
              seconds_played = $1,
              field_goals_made = $2,
              field_goals_attempted = $3,
              field_goal_percentage = $4,
              three_pointers_made = $5,
              three_pointers_attempted = $6,
              three_point_percentage = $7,
              free_throws_made = $8,
              free_throws_attempted = $9,
              free_throw_percentage = $10,
              offensive_rebounds = $11,
              defensive_rebounds = $12,
              rebounds = $13,
              assists = $14,
              steals = $15,
              blocks = $16,
              turnovers = $17,
              personal_fouls = $18,
              points = $19,
              plus_minus = $20
            WHERE id = $21
            "#,
        );
        let result = bind_stats(query, stats)
            .bind(stats_id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Rejected(format!("stats row {stats_id} does not exist")));
        }
        Ok(())
    }

    async fn insert_stats_link(&mut self, key: &StatsKey, stats_id: i64) -> Result<(), StoreError> {
        match key.subject {
            StatsSubject::Team { team_id } => {
                sqlx::query(
                    "INSERT INTO team_game_stats (team_id, game_id, stats_id) VALUES ($1, $2, $3)",
                )
                .bind(team_id)
                .bind(key.game_id.as_str())
                .bind(stats_id)
                .execute(&mut *self.tx)
                .await?;
            }
            StatsSubject::Player { player_id, team_id } => {
                sqlx::query(
                    "INSERT INTO player_game_stats (player_id, game_id, team_id, stats_id) VALUES ($1, $2, $3, $4)",
                )
                .bind(player_id)
                .bind(key.game_id.as_str())
                .bind(team_id)
                .bind(stats_id)
                .execute(&mut *self.tx)
                .await?;
            }
        }
        Ok(())
    }

    async fn upsert_shot(&mut self, shot: &Shot) -> Result<(), StoreError> {
        sqlx::query(UPSERT_SHOT.as_str())
            .bind(shot.game_id.as_str())
            .bind(shot.player_id)
            .bind(shot.number)
            .bind(shot.made)
            .bind(shot.points)
            .bind(shot.home)
            .bind(shot.period)
            .bind(shot.game_clock_seconds)
            .bind(shot.shot_clock)
            .bind(shot.dribbles)
            .bind(shot.touch_time_seconds)
            .bind(shot.distance_feet)
            .bind(shot.points_type)
            .bind(shot.closest_defender_player_id)
            .bind(shot.closest_defender_distance)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_shot_detail(
        &mut self,
        key: &ShotKey,
        detail: &ShotDetail,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE shots SET
              shot_type = $4,
              zone = $5,
              area = $6,
              location_x = $7,
              location_y = $8
            WHERE game_id = $1 AND player_id = $2 AND shot_number = $3
            "#,
        )
        .bind(key.game_id.as_str())
        .bind(key.player_id)
        .bind(key.number)
        .bind(&detail.shot_type)
        .bind(&detail.zone)
        .bind(&detail.area)
        .bind(detail.location_x)
        .bind(detail.location_y)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_event(&mut self, event: &GameEvent) -> Result<(), StoreError> {
        let [player1, player2, player3] = event.player_ids;
        sqlx::query(UPSERT_EVENT.as_str())
            .bind(event.game_id.as_str())
            .bind(event.sequence)
            .bind(event.kind.as_str())
            .bind(event.period)
            .bind(event.score.map(|score| score.home))
            .bind(event.score.map(|score| score.visitor))
            .bind(event.period_time_seconds)
            .bind(&event.wall_clock)
            .bind(player1)
            .bind(player2)
            .bind(player3)
            .bind(&event.home_description)
            .bind(&event.neutral_description)
            .bind(&event.visitor_description)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>;

fn bind_stats<'q>(query: PgQuery<'q>, stats: &Stats) -> PgQuery<'q> {
    query
        .bind(stats.seconds_played)
        .bind(stats.field_goals_made)
        .bind(stats.field_goals_attempted)
        .bind(stats.field_goal_percentage)
        .bind(stats.three_pointers_made)
        .bind(stats.three_pointers_attempted)
        .bind(stats.three_point_percentage)
        .bind(stats.free_throws_made)
        .bind(stats.free_throws_attempted)
        .bind(stats.free_throw_percentage)
        .bind(stats.offensive_rebounds)
        .bind(stats.defensive_rebounds)
        .bind(stats.rebounds)
        .bind(stats.assists)
        .bind(stats.steals)
        .bind(stats.blocks)
        .bind(stats.turnovers)
        .bind(stats.personal_fouls)
        .bind(stats.points)
        .bind(stats.plus_minus)
}
