//! Row schemas and multi-table response shapes for each upstream endpoint.
//!
//! Schemas are built once per process. The stat line columns shared by team
//! and player box-score rows live in a single schema nested into both.

use std::collections::HashSet;
use std::sync::Arc;

use hoopsync_core::{BoxScore, Official, Player, PlayerStats, RosterStatus, Stats, Team, TeamStats};
use hoopsync_results::{DecodeError, DecodeResponse, RecordSchema, Response};
use once_cell::sync::Lazy;

use crate::convert::minutes_to_seconds;

static FRANCHISE: Lazy<RecordSchema<Team>> = Lazy::new(|| {
    RecordSchema::builder("FranchiseHistoryRow")
        .field("TEAM_ID", |t: &mut Team, v| t.id = v)
        .field("TEAM_CITY", |t: &mut Team, v| t.city = v)
        .field("TEAM_NAME", |t: &mut Team, v| t.name = v)
        .field("START_YEAR", |t: &mut Team, v| t.start_year = v)
        .field("END_YEAR", |t: &mut Team, v| t.end_year = v)
        .field("GAMES", |t: &mut Team, v| t.games = v)
        .field("WINS", |t: &mut Team, v| t.wins = v)
        .field("LOSSES", |t: &mut Team, v| t.losses = v)
        .optional("WIN_PCT", |t: &mut Team, v| t.win_percentage = v)
        .optional("PO_APPEARANCES", |t: &mut Team, v| t.playoff_appearances = v)
        .optional("DIV_TITLES", |t: &mut Team, v| t.division_titles = v)
        .optional("CONF_TITLES", |t: &mut Team, v| t.conference_titles = v)
        .optional("LEAGUE_TITLES", |t: &mut Team, v| t.league_titles = v)
        .build()
});

static ROSTER: Lazy<RecordSchema<Player>> = Lazy::new(|| {
    RecordSchema::builder("CommonAllPlayersRow")
        .field("PERSON_ID", |p: &mut Player, v| p.id = v)
        .field("DISPLAY_LAST_COMMA_FIRST", |p: &mut Player, v| p.display_name = v)
        .optional("ROSTERSTATUS", |p: &mut Player, v: i64| {
            p.roster_status = if v == 1 {
                RosterStatus::Active
            } else {
                RosterStatus::Inactive
            }
        })
        .optional("FROM_YEAR", |p: &mut Player, v| p.career_start_year = v)
        .optional("TO_YEAR", |p: &mut Player, v| p.career_end_year = v)
        .optional("PLAYERCODE", |p: &mut Player, v| p.player_code = v)
        .build()
});

/// Raw `CommonPlayerInfo` row; text columns are converted by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerInfoRow {
    pub person_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<String>,
    pub school: Option<String>,
    pub country: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub season_experience: i32,
    pub jersey: Option<String>,
    pub position: Option<String>,
    pub roster_status: Option<String>,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub team_abbreviation: Option<String>,
    pub team_city: Option<String>,
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
    pub dleague_flag: Option<String>,
}

static PLAYER_INFO: Lazy<RecordSchema<PlayerInfoRow>> = Lazy::new(|| {
    RecordSchema::builder("CommonPlayerInfoRow")
        .field("PERSON_ID", |r: &mut PlayerInfoRow, v| r.person_id = v)
        .field("FIRST_NAME", |r: &mut PlayerInfoRow, v| r.first_name = v)
        .field("LAST_NAME", |r: &mut PlayerInfoRow, v| r.last_name = v)
        .optional("BIRTHDATE", |r: &mut PlayerInfoRow, v: String| r.birthdate = Some(v))
        .optional("SCHOOL", |r: &mut PlayerInfoRow, v: String| r.school = Some(v))
        .optional("COUNTRY", |r: &mut PlayerInfoRow, v: String| r.country = Some(v))
        .optional("HEIGHT", |r: &mut PlayerInfoRow, v: String| r.height = Some(v))
        .optional("WEIGHT", |r: &mut PlayerInfoRow, v: String| r.weight = Some(v))
        .optional("SEASON_EXP", |r: &mut PlayerInfoRow, v| r.season_experience = v)
        .optional("JERSEY", |r: &mut PlayerInfoRow, v: String| r.jersey = Some(v))
        .optional("POSITION", |r: &mut PlayerInfoRow, v: String| r.position = Some(v))
        .optional("ROSTERSTATUS", |r: &mut PlayerInfoRow, v: String| {
            r.roster_status = Some(v)
        })
        .optional("TEAM_ID", |r: &mut PlayerInfoRow, v: i64| r.team_id = Some(v))
        .optional("TEAM_NAME", |r: &mut PlayerInfoRow, v: String| r.team_name = Some(v))
        .optional("TEAM_ABBREVIATION", |r: &mut PlayerInfoRow, v: String| {
            r.team_abbreviation = Some(v)
        })
        .optional("TEAM_CITY", |r: &mut PlayerInfoRow, v: String| r.team_city = Some(v))
        .optional("FROM_YEAR", |r: &mut PlayerInfoRow, v: i32| r.from_year = Some(v))
        .optional("TO_YEAR", |r: &mut PlayerInfoRow, v: i32| r.to_year = Some(v))
        .optional("DLEAGUE_FLAG", |r: &mut PlayerInfoRow, v: String| {
            r.dleague_flag = Some(v)
        })
        .build()
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameLogRow {
    pub team_id: i64,
    pub game_id: String,
}

static GAME_LOG: Lazy<RecordSchema<GameLogRow>> = Lazy::new(|| {
    RecordSchema::builder("TeamGameLogRow")
        .optional("Team_ID", |r: &mut GameLogRow, v| r.team_id = v)
        .field("Game_ID", |r: &mut GameLogRow, v| r.game_id = v)
        .build()
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSummaryRow {
    pub game_date_est: String,
    pub game_id: String,
    pub status_id: i64,
    pub home_team_id: i64,
    pub visitor_team_id: i64,
    pub season: String,
    pub national_tv: Option<String>,
}

static GAME_SUMMARY: Lazy<RecordSchema<GameSummaryRow>> = Lazy::new(|| {
    RecordSchema::builder("GameSummaryRow")
        .field("GAME_DATE_EST", |r: &mut GameSummaryRow, v| r.game_date_est = v)
        .field("GAME_ID", |r: &mut GameSummaryRow, v| r.game_id = v)
        .field("GAME_STATUS_ID", |r: &mut GameSummaryRow, v| r.status_id = v)
        .field("HOME_TEAM_ID", |r: &mut GameSummaryRow, v| r.home_team_id = v)
        .field("VISITOR_TEAM_ID", |r: &mut GameSummaryRow, v| r.visitor_team_id = v)
        .field("SEASON", |r: &mut GameSummaryRow, v| r.season = v)
        .optional("NATL_TV_BROADCASTER_ABBREVIATION", |r: &mut GameSummaryRow, v: String| {
            r.national_tv = Some(v)
        })
        .build()
});

static OFFICIALS: Lazy<RecordSchema<Official>> = Lazy::new(|| {
    RecordSchema::builder("OfficialRow")
        .field("OFFICIAL_ID", |o: &mut Official, v| o.id = v)
        .field("FIRST_NAME", |o: &mut Official, v| o.first_name = v)
        .field("LAST_NAME", |o: &mut Official, v| o.last_name = v)
        .optional("JERSEY_NUM", |o: &mut Official, v: String| {
            let jersey = v.trim();
            if !jersey.is_empty() {
                o.jersey_number = Some(jersey.to_string());
            }
        })
        .build()
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineScoreRow {
    pub team_id: i64,
    pub points: Option<i32>,
}

static LINE_SCORE: Lazy<RecordSchema<LineScoreRow>> = Lazy::new(|| {
    RecordSchema::builder("LineScoreRow")
        .field("TEAM_ID", |r: &mut LineScoreRow, v| r.team_id = v)
        .optional("PTS", |r: &mut LineScoreRow, v: i32| r.points = Some(v))
        .build()
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastMeetingRow {
    pub last_game_id: Option<String>,
}

static LAST_MEETING: Lazy<RecordSchema<LastMeetingRow>> = Lazy::new(|| {
    RecordSchema::builder("LastMeetingRow")
        .optional("LAST_GAME_ID", |r: &mut LastMeetingRow, v: String| {
            r.last_game_id = Some(v)
        })
        .build()
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameInfoRow {
    pub attendance: Option<i32>,
    pub game_time: Option<String>,
}

static GAME_INFO: Lazy<RecordSchema<GameInfoRow>> = Lazy::new(|| {
    RecordSchema::builder("GameInfoRow")
        .optional("ATTENDANCE", |r: &mut GameInfoRow, v: i32| r.attendance = Some(v))
        .optional("GAME_TIME", |r: &mut GameInfoRow, v: String| r.game_time = Some(v))
        .build()
});

/// Columns every box-score row carries. Players who did not play report nulls.
static STAT_LINE: Lazy<Arc<RecordSchema<Stats>>> = Lazy::new(|| {
    Arc::new(
        RecordSchema::builder("StatLine")
            .optional("MIN", |s: &mut Stats, v: String| {
                s.seconds_played = minutes_to_seconds(&v)
            })
            .optional("FGM", |s: &mut Stats, v| s.field_goals_made = v)
            .optional("FGA", |s: &mut Stats, v| s.field_goals_attempted = v)
            .optional("FG_PCT", |s: &mut Stats, v| s.field_goal_percentage = v)
            .optional("FG3M", |s: &mut Stats, v| s.three_pointers_made = v)
            .optional("FG3A", |s: &mut Stats, v| s.three_pointers_attempted = v)
            .optional("FG3_PCT", |s: &mut Stats, v| s.three_point_percentage = v)
            .optional("FTM", |s: &mut Stats, v| s.free_throws_made = v)
            .optional("FTA", |s: &mut Stats, v| s.free_throws_attempted = v)
            .optional("FT_PCT", |s: &mut Stats, v| s.free_throw_percentage = v)
            .optional("OREB", |s: &mut Stats, v| s.offensive_rebounds = v)
            .optional("DREB", |s: &mut Stats, v| s.defensive_rebounds = v)
            .optional("REB", |s: &mut Stats, v| s.rebounds = v)
            .optional("AST", |s: &mut Stats, v| s.assists = v)
            .optional("STL", |s: &mut Stats, v| s.steals = v)
            .optional("BLK", |s: &mut Stats, v| s.blocks = v)
            .optional("TO", |s: &mut Stats, v| s.turnovers = v)
            .optional("PF", |s: &mut Stats, v| s.personal_fouls = v)
            .optional("PTS", |s: &mut Stats, v| s.points = v)
            .optional("PLUS_MINUS", |s: &mut Stats, v| s.plus_minus = v)
            .build(),
    )
});

static PLAYER_STATS: Lazy<RecordSchema<PlayerStats>> = Lazy::new(|| {
    RecordSchema::builder("PlayerStatsRow")
        .field("PLAYER_ID", |p: &mut PlayerStats, v| p.player_id = v)
        .field("PLAYER_NAME", |p: &mut PlayerStats, v| p.player_name = v)
        .field("TEAM_ID", |p: &mut PlayerStats, v| p.team_id = v)
        .optional("START_POSITION", |p: &mut PlayerStats, v: String| {
            if !v.trim().is_empty() {
                p.start_position = Some(v.trim().to_string());
            }
        })
        .optional("COMMENT", |p: &mut PlayerStats, v: String| {
            if !v.trim().is_empty() {
                p.comment = Some(v.trim().to_string());
            }
        })
        .nested(Arc::clone(&STAT_LINE), |p: &mut PlayerStats| &mut p.stats)
        .build()
});

static TEAM_STATS: Lazy<RecordSchema<TeamStats>> = Lazy::new(|| {
    RecordSchema::builder("TeamStatsRow")
        .field("TEAM_ID", |t: &mut TeamStats, v| t.team_id = v)
        .optional("TEAM_NAME", |t: &mut TeamStats, v| t.team_name = v)
        .optional("TEAM_ABBREVIATION", |t: &mut TeamStats, v| t.team_abbreviation = v)
        .optional("TEAM_CITY", |t: &mut TeamStats, v| t.team_city = v)
        .nested(Arc::clone(&STAT_LINE), |t: &mut TeamStats| &mut t.stats)
        .build()
});

/// Raw `PtShotLog` row; clock and result columns are converted by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotLogRow {
    pub game_id: String,
    pub location: String,
    pub shot_number: i32,
    pub period: i32,
    pub game_clock: String,
    pub shot_clock: Option<f64>,
    pub dribbles: i32,
    pub touch_time: f64,
    pub shot_distance: f64,
    pub points_type: i32,
    pub shot_result: String,
    pub closest_defender_player_id: Option<i64>,
    pub closest_defender_distance: f64,
    pub points: i32,
}

static SHOT_LOG: Lazy<RecordSchema<ShotLogRow>> = Lazy::new(|| {
    RecordSchema::builder("PtShotLogRow")
        .field("GAME_ID", |r: &mut ShotLogRow, v| r.game_id = v)
        .optional("LOCATION", |r: &mut ShotLogRow, v| r.location = v)
        .field("SHOT_NUMBER", |r: &mut ShotLogRow, v| r.shot_number = v)
        .field("PERIOD", |r: &mut ShotLogRow, v| r.period = v)
        .optional("GAME_CLOCK", |r: &mut ShotLogRow, v| r.game_clock = v)
        .optional("SHOT_CLOCK", |r: &mut ShotLogRow, v: f64| r.shot_clock = Some(v))
        .optional("DRIBBLES", |r: &mut ShotLogRow, v| r.dribbles = v)
        .optional("TOUCH_TIME", |r: &mut ShotLogRow, v| r.touch_time = v)
        .optional("SHOT_DIST", |r: &mut ShotLogRow, v| r.shot_distance = v)
        .optional("PTS_TYPE", |r: &mut ShotLogRow, v| r.points_type = v)
        .field("SHOT_RESULT", |r: &mut ShotLogRow, v| r.shot_result = v)
        .optional("CLOSEST_DEFENDER_PLAYER_ID", |r: &mut ShotLogRow, v: i64| {
            r.closest_defender_player_id = Some(v).filter(|id| *id != 0)
        })
        .optional("CLOSE_DEF_DIST", |r: &mut ShotLogRow, v| r.closest_defender_distance = v)
        .optional("PTS", |r: &mut ShotLogRow, v| r.points = v)
        .build()
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotChartRow {
    pub game_id: String,
    pub game_event_id: i64,
    pub player_id: i64,
    pub period: i32,
    pub minutes_remaining: i32,
    pub seconds_remaining: i32,
    pub action_type: String,
    pub zone_basic: String,
    pub zone_area: String,
    pub location_x: i32,
    pub location_y: i32,
}

static SHOT_CHART: Lazy<RecordSchema<ShotChartRow>> = Lazy::new(|| {
    RecordSchema::builder("ShotChartDetailRow")
        .field("GAME_ID", |r: &mut ShotChartRow, v| r.game_id = v)
        .field("GAME_EVENT_ID", |r: &mut ShotChartRow, v| r.game_event_id = v)
        .field("PLAYER_ID", |r: &mut ShotChartRow, v| r.player_id = v)
        .field("PERIOD", |r: &mut ShotChartRow, v| r.period = v)
        .optional("MINUTES_REMAINING", |r: &mut ShotChartRow, v| r.minutes_remaining = v)
        .optional("SECONDS_REMAINING", |r: &mut ShotChartRow, v| r.seconds_remaining = v)
        .optional("ACTION_TYPE", |r: &mut ShotChartRow, v| r.action_type = v)
        .optional("SHOT_ZONE_BASIC", |r: &mut ShotChartRow, v| r.zone_basic = v)
        .optional("SHOT_ZONE_AREA", |r: &mut ShotChartRow, v| r.zone_area = v)
        .optional("LOC_X", |r: &mut ShotChartRow, v| r.location_x = v)
        .optional("LOC_Y", |r: &mut ShotChartRow, v| r.location_y = v)
        .build()
});

/// One player slot of a play-by-play row. Empty slots carry zero ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPlayer {
    pub id: i64,
    pub name: String,
    pub team_id: i64,
}

impl EventPlayer {
    /// Team and neutral events put team ids or zeros in player slots.
    pub fn player_id(&self) -> Option<i64> {
        (self.id != 0 && !self.name.trim().is_empty() && self.team_id != 0).then_some(self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayByPlayRow {
    pub game_id: String,
    pub event_number: i32,
    pub message_type: i64,
    pub period: i32,
    pub wall_clock: String,
    pub period_clock: String,
    pub home_description: Option<String>,
    pub neutral_description: Option<String>,
    pub visitor_description: Option<String>,
    pub score: Option<String>,
    pub players: [EventPlayer; 3],
}

static PLAY_BY_PLAY: Lazy<RecordSchema<PlayByPlayRow>> = Lazy::new(|| {
    RecordSchema::builder("PlayByPlayRow")
        .field("GAME_ID", |r: &mut PlayByPlayRow, v| r.game_id = v)
        .field("EVENTNUM", |r: &mut PlayByPlayRow, v| r.event_number = v)
        .field("EVENTMSGTYPE", |r: &mut PlayByPlayRow, v| r.message_type = v)
        .field("PERIOD", |r: &mut PlayByPlayRow, v| r.period = v)
        .optional("WCTIMESTRING", |r: &mut PlayByPlayRow, v| r.wall_clock = v)
        .optional("PCTIMESTRING", |r: &mut PlayByPlayRow, v| r.period_clock = v)
        .optional("HOMEDESCRIPTION", |r: &mut PlayByPlayRow, v: String| {
            r.home_description = Some(v)
        })
        .optional("NEUTRALDESCRIPTION", |r: &mut PlayByPlayRow, v: String| {
            r.neutral_description = Some(v)
        })
        .optional("VISITORDESCRIPTION", |r: &mut PlayByPlayRow, v: String| {
            r.visitor_description = Some(v)
        })
        .optional("SCORE", |r: &mut PlayByPlayRow, v: String| r.score = Some(v))
        .optional("PLAYER1_ID", |r: &mut PlayByPlayRow, v| r.players[0].id = v)
        .optional("PLAYER1_NAME", |r: &mut PlayByPlayRow, v| r.players[0].name = v)
        .optional("PLAYER1_TEAM_ID", |r: &mut PlayByPlayRow, v| r.players[0].team_id = v)
        .optional("PLAYER2_ID", |r: &mut PlayByPlayRow, v| r.players[1].id = v)
        .optional("PLAYER2_NAME", |r: &mut PlayByPlayRow, v| r.players[1].name = v)
        .optional("PLAYER2_TEAM_ID", |r: &mut PlayByPlayRow, v| r.players[1].team_id = v)
        .optional("PLAYER3_ID", |r: &mut PlayByPlayRow, v| r.players[2].id = v)
        .optional("PLAYER3_NAME", |r: &mut PlayByPlayRow, v| r.players[2].name = v)
        .optional("PLAYER3_TEAM_ID", |r: &mut PlayByPlayRow, v| r.players[2].team_id = v)
        .build()
});

/// `franchisehistory`
#[derive(Debug, Default)]
pub struct FranchiseHistory {
    pub rows: Vec<Team>,
}

impl FranchiseHistory {
    /// One team per id. The first row for a franchise carries its cumulative record.
    pub fn present(self) -> Vec<Team> {
        let mut seen = HashSet::new();
        self.rows
            .into_iter()
            .filter(|team| seen.insert(team.id))
            .collect()
    }
}

impl DecodeResponse for FranchiseHistory {
    fn decode_response(response: &Response) -> Result<Self, DecodeError> {
        Ok(Self {
            rows: response.slot("FranchiseHistory", &FRANCHISE)?,
        })
    }
}

/// `commonallplayers`
#[derive(Debug, Default)]
pub struct CommonAllPlayers {
    pub players: Vec<Player>,
}

impl DecodeResponse for CommonAllPlayers {
    fn decode_response(response: &Response) -> Result<Self, DecodeError> {
        Ok(Self {
            players: response.slot("CommonAllPlayers", &ROSTER)?,
        })
    }
}

/// `commonplayerinfo`
#[derive(Debug, Default)]
pub struct CommonPlayerInfo {
    pub info: Vec<PlayerInfoRow>,
}

impl DecodeResponse for CommonPlayerInfo {
    fn decode_response(response: &Response) -> Result<Self, DecodeError> {
        Ok(Self {
            info: response.slot("CommonPlayerInfo", &PLAYER_INFO)?,
        })
    }
}

/// `teamgamelog`
#[derive(Debug, Default)]
pub struct TeamGameLog {
    pub games: Vec<GameLogRow>,
}

impl DecodeResponse for TeamGameLog {
    fn decode_response(response: &Response) -> Result<Self, DecodeError> {
        Ok(Self {
            games: response.slot("TeamGameLog", &GAME_LOG)?,
        })
    }
}

/// `boxscoresummaryv2`
#[derive(Debug, Default)]
pub struct BoxScoreSummary {
    pub summary: Vec<GameSummaryRow>,
    pub officials: Vec<Official>,
    pub line_score: Vec<LineScoreRow>,
    pub last_meeting: Vec<LastMeetingRow>,
    pub game_info: Vec<GameInfoRow>,
}

impl DecodeResponse for BoxScoreSummary {
    fn decode_response(response: &Response) -> Result<Self, DecodeError> {
        Ok(Self {
            summary: response.slot("GameSummary", &GAME_SUMMARY)?,
            officials: response.slot("Officials", &OFFICIALS)?,
            line_score: response.slot("LineScore", &LINE_SCORE)?,
            last_meeting: response.slot("LastMeeting", &LAST_MEETING)?,
            game_info: response.slot("GameInfo", &GAME_INFO)?,
        })
    }
}

/// `boxscoretraditionalv2`
#[derive(Debug, Default)]
pub struct BoxScoreTraditional {
    pub players: Vec<PlayerStats>,
    pub teams: Vec<TeamStats>,
}

impl DecodeResponse for BoxScoreTraditional {
    fn decode_response(response: &Response) -> Result<Self, DecodeError> {
        Ok(Self {
            players: response.slot("PlayerStats", &PLAYER_STATS)?,
            teams: response.slot("TeamStats", &TEAM_STATS)?,
        })
    }
}

/// `playerdashptshotlog`
#[derive(Debug, Default)]
pub struct PlayerShotLog {
    pub shots: Vec<ShotLogRow>,
}

impl DecodeResponse for PlayerShotLog {
    fn decode_response(response: &Response) -> Result<Self, DecodeError> {
        Ok(Self {
            shots: response.slot("PtShotLog", &SHOT_LOG)?,
        })
    }
}

/// `shotchartdetail`
#[derive(Debug, Default)]
pub struct ShotChartDetail {
    pub shots: Vec<ShotChartRow>,
}

impl ShotChartDetail {
    /// Attempts in the order they happened: by period, then clock counting down.
    pub fn in_game_order(mut self) -> Vec<ShotChartRow> {
        self.shots.sort_by(|a, b| {
            a.period
                .cmp(&b.period)
                .then_with(|| {
                    let left = |r: &ShotChartRow| r.minutes_remaining * 60 + r.seconds_remaining;
                    left(b).cmp(&left(a))
                })
                .then_with(|| a.game_event_id.cmp(&b.game_event_id))
        });
        self.shots
    }
}

impl DecodeResponse for ShotChartDetail {
    fn decode_response(response: &Response) -> Result<Self, DecodeError> {
        Ok(Self {
            shots: response.slot("Shot_Chart_Detail", &SHOT_CHART)?,
        })
    }
}

/// `playbyplayv2`
#[derive(Debug, Default)]
pub struct PlayByPlay {
    pub events: Vec<PlayByPlayRow>,
}

impl DecodeResponse for PlayByPlay {
    fn decode_response(response: &Response) -> Result<Self, DecodeError> {
        Ok(Self {
            events: response.slot("PlayByPlay", &PLAY_BY_PLAY)?,
        })
    }
}

impl From<BoxScoreTraditional> for BoxScore {
    fn from(value: BoxScoreTraditional) -> Self {
        BoxScore {
            team_stats: value.teams,
            player_stats: value.players,
        }
    }
}
