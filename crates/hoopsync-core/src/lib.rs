//! Core domain model for hoopsync: teams, players, games and stat lines.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CRATE_NAME: &str = "hoopsync-core";

/// Unique identifier for a game, stable across seasons and teams (e.g. `0021401185`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The third character encodes the competition phase; `4` marks a playoff game.
    pub fn is_playoff(&self) -> bool {
        self.0.as_bytes().get(2) == Some(&b'4')
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GameId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Status of a game as reported by the upstream `GAME_STATUS_ID` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Scheduled,
    Live,
    Final,
    Unknown,
}

impl GameStatus {
    pub const KNOWN: [GameStatus; 3] = [GameStatus::Scheduled, GameStatus::Live, GameStatus::Final];

    pub fn from_id(id: i64) -> Self {
        match id {
            1 => Self::Scheduled,
            2 => Self::Live,
            3 => Self::Final,
            _ => Self::Unknown,
        }
    }

    pub fn id(self) -> i16 {
        match self {
            Self::Scheduled => 1,
            Self::Live => 2,
            Self::Final => 3,
            Self::Unknown => 0,
        }
    }

    pub fn is_final(self) -> bool {
        self == Self::Final
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid season `{0}`: expected `YYYY-YY` with consecutive years")]
pub struct SeasonParseError(pub String);

/// A league season such as `2014-15`. Seasons roll over on July 1st.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season {
    start_year: i32,
}

impl Season {
    pub fn from_start_year(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= 7 {
            Self::from_start_year(date.year())
        } else {
            Self::from_start_year(date.year() - 1)
        }
    }

    pub fn fall_year(self) -> i32 {
        self.start_year
    }

    pub fn spring_year(self) -> i32 {
        self.start_year + 1
    }

    pub fn add_years(self, years: i32) -> Self {
        Self::from_start_year(self.start_year + years)
    }

    pub fn previous(self) -> Self {
        self.add_years(-1)
    }

    pub fn next(self) -> Self {
        self.add_years(1)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.start_year, self.spring_year().rem_euclid(100))
    }
}

impl FromStr for Season {
    type Err = SeasonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SeasonParseError(s.to_string());
        let (start, end) = s.trim().split_once('-').ok_or_else(err)?;
        if start.len() != 4 || end.len() != 2 {
            return Err(err());
        }
        let start_year: i32 = start.parse().map_err(|_| err())?;
        let end_year: i32 = end.parse().map_err(|_| err())?;
        if end_year != (start_year + 1).rem_euclid(100) {
            return Err(err());
        }
        Ok(Self::from_start_year(start_year))
    }
}

impl TryFrom<String> for Season {
    type Error = SeasonParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Season> for String {
    fn from(value: Season) -> Self {
        value.to_string()
    }
}

/// Competitive phase of a season, used to query per-team game logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeasonType {
    RegularSeason,
    Playoffs,
}

impl SeasonType {
    pub const ALL: [SeasonType; 2] = [SeasonType::RegularSeason, SeasonType::Playoffs];

    pub fn as_param(self) -> &'static str {
        match self {
            Self::RegularSeason => "Regular Season",
            Self::Playoffs => "Playoffs",
        }
    }
}

/// A franchise with its cumulative history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub city: String,
    pub name: String,
    pub start_year: String,
    pub end_year: String,
    pub games: i32,
    pub wins: i32,
    pub losses: i32,
    pub win_percentage: f64,
    pub playoff_appearances: i32,
    pub division_titles: i32,
    pub conference_titles: i32,
    pub league_titles: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RosterStatus {
    #[default]
    Inactive,
    Active,
}

/// Roster entry from the historical player listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub display_name: String,
    pub roster_status: RosterStatus,
    pub career_start_year: String,
    pub career_end_year: String,
    pub player_code: String,
}

/// Biographical and current-team attributes for one player.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerDetails {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
    pub school: Option<String>,
    pub country: Option<String>,
    pub height_inches: Option<i32>,
    pub weight_pounds: Option<i32>,
    pub season_experience: i32,
    pub jersey: Option<String>,
    pub position: Option<String>,
    pub roster_status: RosterStatus,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub team_abbreviation: Option<String>,
    pub team_city: Option<String>,
    pub career_start_year: Option<i32>,
    pub career_end_year: Option<i32>,
    pub dleague: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetails {
    pub id: GameId,
    pub season: Season,
    pub status: GameStatus,
    pub date: Option<NaiveDate>,
    pub home_team_id: i64,
    pub visitor_team_id: i64,
    pub home_points: Option<i32>,
    pub visitor_points: Option<i32>,
    pub attendance: Option<i32>,
    pub length_minutes: Option<i32>,
    pub last_meeting_game_id: Option<GameId>,
    pub national_tv: Option<String>,
    pub playoffs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Official {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub jersey_number: Option<String>,
}

/// Association between a game and one of the officials who worked it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Officiated {
    pub game_id: GameId,
    pub official_id: i64,
}

/// A stat line. Embedded by team and player box-score entries; the period it
/// covers depends on context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub seconds_played: i32,
    pub field_goals_made: i32,
    pub field_goals_attempted: i32,
    pub field_goal_percentage: f64,
    pub three_pointers_made: i32,
    pub three_pointers_attempted: i32,
    pub three_point_percentage: f64,
    pub free_throws_made: i32,
    pub free_throws_attempted: i32,
    pub free_throw_percentage: f64,
    pub offensive_rebounds: i32,
    pub defensive_rebounds: i32,
    pub rebounds: i32,
    pub assists: i32,
    pub steals: i32,
    pub blocks: i32,
    pub turnovers: i32,
    pub personal_fouls: i32,
    pub points: i32,
    pub plus_minus: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamStats {
    pub team_id: i64,
    pub team_name: String,
    pub team_abbreviation: String,
    pub team_city: String,
    pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: i64,
    pub player_name: String,
    pub team_id: i64,
    pub start_position: Option<String>,
    pub comment: Option<String>,
    pub stats: Stats,
}

/// An individual game's box score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxScore {
    pub team_stats: Vec<TeamStats>,
    pub player_stats: Vec<PlayerStats>,
}

impl BoxScore {
    pub fn team(&self, team_id: i64) -> Option<&TeamStats> {
        self.team_stats.iter().find(|t| t.team_id == team_id)
    }

    pub fn player(&self, player_id: i64) -> Option<&PlayerStats> {
        self.player_stats.iter().find(|p| p.player_id == player_id)
    }
}

/// Who a persisted stat line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatsSubject {
    Team { team_id: i64 },
    Player { player_id: i64, team_id: i64 },
}

impl StatsSubject {
    pub fn subject_id(self) -> i64 {
        match self {
            Self::Team { team_id } => team_id,
            Self::Player { player_id, .. } => player_id,
        }
    }
}

/// Composite key `(subject, game)` resolving a stat line to its durable row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsKey {
    pub subject: StatsSubject,
    pub game_id: GameId,
}

/// One field-goal attempt from a player's shot log.
///
/// A shot is identified by `(game_id, player_id, number)`, where `number` is
/// the attempt's position in the player's game, starting at 1. The court
/// location arrives later from the shot chart and lives in `detail`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shot {
    pub game_id: GameId,
    pub player_id: i64,
    pub number: i32,
    pub made: bool,
    pub points: i32,
    pub home: bool,
    pub period: i32,
    /// Seconds left on the game clock when the shot went up.
    pub game_clock_seconds: i32,
    pub shot_clock: Option<f64>,
    pub dribbles: i32,
    pub touch_time_seconds: f64,
    pub distance_feet: f64,
    pub points_type: i32,
    pub closest_defender_player_id: Option<i64>,
    pub closest_defender_distance: f64,
    pub detail: Option<ShotDetail>,
}

impl Shot {
    pub fn key(&self) -> ShotKey {
        ShotKey {
            game_id: self.game_id.clone(),
            player_id: self.player_id,
            number: self.number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShotKey {
    pub game_id: GameId,
    pub player_id: i64,
    pub number: i32,
}

/// Shot-chart attributes for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShotDetail {
    pub shot_type: String,
    pub zone: String,
    pub area: String,
    pub location_x: i32,
    pub location_y: i32,
}

/// A player's appearance in a stored game, the unit shot charts are requested for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerGame {
    pub player_id: i64,
    pub team_id: i64,
    pub game_id: GameId,
    pub season: Season,
}

/// Play-by-play message type (`EVENTMSGTYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    FieldGoalMade,
    FieldGoalMissed,
    FreeThrow,
    Rebound,
    Turnover,
    Foul,
    Violation,
    Substitution,
    Timeout,
    JumpBall,
    Ejection,
    PeriodStart,
    PeriodEnd,
    Other,
}

impl EventKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::FieldGoalMade,
            2 => Self::FieldGoalMissed,
            3 => Self::FreeThrow,
            4 => Self::Rebound,
            5 => Self::Turnover,
            6 => Self::Foul,
            7 => Self::Violation,
            8 => Self::Substitution,
            9 => Self::Timeout,
            10 => Self::JumpBall,
            11 => Self::Ejection,
            12 => Self::PeriodStart,
            13 => Self::PeriodEnd,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FieldGoalMade => "field_goal_made",
            Self::FieldGoalMissed => "field_goal_missed",
            Self::FreeThrow => "free_throw",
            Self::Rebound => "rebound",
            Self::Turnover => "turnover",
            Self::Foul => "foul",
            Self::Violation => "violation",
            Self::Substitution => "substitution",
            Self::Timeout => "timeout",
            Self::JumpBall => "jump_ball",
            Self::Ejection => "ejection",
            Self::PeriodStart => "period_start",
            Self::PeriodEnd => "period_end",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: i32,
    pub visitor: i32,
}

/// One play-by-play event, keyed by `(game_id, sequence)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub game_id: GameId,
    pub sequence: i32,
    pub kind: EventKind,
    pub period: i32,
    /// Score after the event, when it changed.
    pub score: Option<Score>,
    /// Seconds left in the period.
    pub period_time_seconds: i32,
    pub wall_clock: String,
    pub player_ids: [Option<i64>; 3],
    pub home_description: Option<String>,
    pub neutral_description: Option<String>,
    pub visitor_description: Option<String>,
}
