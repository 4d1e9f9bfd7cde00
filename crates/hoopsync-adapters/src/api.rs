use std::sync::Arc;

use hoopsync_core::{
    BoxScore, EventKind, GameDetails, GameEvent, GameId, GameStatus, Official, Player,
    PlayerDetails, PlayerGame, RosterStatus, Season, SeasonType, Shot, ShotDetail, Team,
};
use tracing::debug;

use crate::convert::{
    clock_to_seconds, hours_minutes_to_minutes, parse_birthdate, parse_game_date,
    parse_height_inches, parse_score, parse_season_column,
};
use crate::endpoints::{
    BoxScoreSummary, BoxScoreTraditional, CommonAllPlayers, CommonPlayerInfo, FranchiseHistory,
    PlayByPlay, PlayByPlayRow, PlayerInfoRow, PlayerShotLog, ShotChartDetail, ShotLogRow,
    TeamGameLog,
};
use crate::{AdapterError, Endpoint, Params, StatsSource, LEAGUE_ID};

/// Everything the summary endpoint tells us about one game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub game: GameDetails,
    pub officials: Vec<Official>,
}

/// Typed client over a [`StatsSource`]. Cheap to clone; clones share the source.
#[derive(Clone)]
pub struct StatsApi {
    source: Arc<dyn StatsSource>,
}

impl std::fmt::Debug for StatsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsApi").finish_non_exhaustive()
    }
}

impl StatsApi {
    pub fn new(source: Arc<dyn StatsSource>) -> Self {
        Self { source }
    }

    /// Current franchises, one per team id.
    pub async fn teams(&self) -> Result<Vec<Team>, AdapterError> {
        let params = Params::new().with("LeagueID", LEAGUE_ID);
        let history: FranchiseHistory = self
            .source
            .fetch(Endpoint::FranchiseHistory, &params)
            .await?
            .decode()?;
        Ok(history.present())
    }

    /// Every player who has appeared in the league up to `season`.
    pub async fn historical_players(&self, season: Season) -> Result<Vec<Player>, AdapterError> {
        let params = Params::new()
            .with("LeagueID", LEAGUE_ID)
            .with("Season", season)
            .with("IsOnlyCurrentSeason", 0);
        let roster: CommonAllPlayers = self
            .source
            .fetch(Endpoint::CommonAllPlayers, &params)
            .await?
            .decode()?;
        Ok(roster.players)
    }

    pub async fn player_details(&self, player_id: i64) -> Result<PlayerDetails, AdapterError> {
        let params = Params::new()
            .with("LeagueID", LEAGUE_ID)
            .with("PlayerID", player_id);
        let info: CommonPlayerInfo = self
            .source
            .fetch(Endpoint::CommonPlayerInfo, &params)
            .await?
            .decode()?;
        let row = info
            .info
            .into_iter()
            .next()
            .ok_or(AdapterError::Incomplete {
                endpoint: Endpoint::CommonPlayerInfo,
                table: "CommonPlayerInfo",
            })?;
        player_details_from_row(row)
    }

    pub async fn games_played_by(
        &self,
        team_id: i64,
        season: Season,
        season_type: SeasonType,
    ) -> Result<Vec<GameId>, AdapterError> {
        let params = Params::new()
            .with("LeagueID", LEAGUE_ID)
            .with("Season", season)
            .with("SeasonType", season_type.as_param())
            .with("TeamID", team_id);
        let log: TeamGameLog = self
            .source
            .fetch(Endpoint::TeamGameLog, &params)
            .await?
            .decode()?;
        debug!(team_id, %season, games = log.games.len(), "game log fetched");
        Ok(log.games.into_iter().map(|row| GameId::from(row.game_id)).collect())
    }

    pub async fn game_summary(&self, game_id: &GameId) -> Result<GameSummary, AdapterError> {
        let params = Params::new().with("GameID", game_id);
        let summary: BoxScoreSummary = self
            .source
            .fetch(Endpoint::BoxScoreSummary, &params)
            .await?
            .decode()?;
        game_summary_from_tables(summary)
    }

    pub async fn box_score(&self, game_id: &GameId) -> Result<BoxScore, AdapterError> {
        let params = box_score_params(game_id);
        let traditional: BoxScoreTraditional = self
            .source
            .fetch(Endpoint::BoxScoreTraditional, &params)
            .await?
            .decode()?;
        Ok(traditional.into())
    }

    /// Every tracked field-goal attempt by `player_id` in `season`.
    pub async fn player_shots(
        &self,
        player_id: i64,
        season: Season,
        season_type: SeasonType,
    ) -> Result<Vec<Shot>, AdapterError> {
        let params = Params::new()
            .with("LeagueID", LEAGUE_ID)
            .with("PlayerID", player_id)
            .with("Season", season)
            .with("SeasonType", season_type.as_param());
        let log: PlayerShotLog = self
            .source
            .fetch(Endpoint::PlayerShotLog, &params)
            .await?
            .decode()?;
        log.shots
            .into_iter()
            .map(|row| shot_from_row(player_id, row))
            .collect()
    }

    /// Shot-chart attributes for one player's attempts in one game, in the
    /// order the attempts happened. The n-th entry belongs to shot number n + 1.
    pub async fn shot_chart(
        &self,
        appearance: &PlayerGame,
    ) -> Result<Vec<ShotDetail>, AdapterError> {
        let params = Params::new()
            .with("ContextMeasure", "FGA")
            .with("EndPeriod", 10)
            .with("EndRange", 28800)
            .with("GameID", &appearance.game_id)
            .with("LeagueID", LEAGUE_ID)
            .with("PlayerID", appearance.player_id)
            .with("Season", appearance.season)
            .with("SeasonType", season_type_of(&appearance.game_id).as_param())
            .with("StartPeriod", 1)
            .with("TeamID", appearance.team_id);
        let chart: ShotChartDetail = self
            .source
            .fetch(Endpoint::ShotChartDetail, &params)
            .await?
            .decode()?;
        Ok(chart
            .in_game_order()
            .into_iter()
            .map(|row| ShotDetail {
                shot_type: row.action_type,
                zone: row.zone_basic,
                area: row.zone_area,
                location_x: row.location_x,
                location_y: row.location_y,
            })
            .collect())
    }

    pub async fn play_by_play(
        &self,
        game_id: &GameId,
        season: Season,
    ) -> Result<Vec<GameEvent>, AdapterError> {
        let params = box_score_params(game_id)
            .with("StartPeriod", 1)
            .with("RangeType", 2)
            .with("EndRange", 55800)
            .with("Season", season)
            .with("SeasonType", season_type_of(game_id).as_param());
        let pbp: PlayByPlay = self
            .source
            .fetch(Endpoint::PlayByPlay, &params)
            .await?
            .decode()?;
        pbp.events.into_iter().map(event_from_row).collect()
    }
}

/// The traditional box score needs an explicit full-game range.
fn box_score_params(game_id: &GameId) -> Params {
    Params::new()
        .with("GameID", game_id)
        .with("StartPeriod", 0)
        .with("EndPeriod", 10)
        .with("StartRange", 0)
        .with("EndRange", 28800)
        .with("RangeType", 0)
}

fn season_type_of(game_id: &GameId) -> SeasonType {
    if game_id.is_playoff() {
        SeasonType::Playoffs
    } else {
        SeasonType::RegularSeason
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn player_details_from_row(row: PlayerInfoRow) -> Result<PlayerDetails, AdapterError> {
    let birthdate = match row.birthdate.as_deref() {
        Some(raw) => parse_birthdate(raw)?,
        None => None,
    };
    let roster_status = match row.roster_status.as_deref() {
        Some("Active") => RosterStatus::Active,
        _ => RosterStatus::Inactive,
    };

    Ok(PlayerDetails {
        id: row.person_id,
        first_name: row.first_name,
        last_name: row.last_name,
        birthdate,
        school: non_empty(row.school),
        country: non_empty(row.country),
        height_inches: row.height.as_deref().and_then(parse_height_inches),
        weight_pounds: row.weight.as_deref().and_then(|w| w.trim().parse().ok()),
        season_experience: row.season_experience,
        jersey: non_empty(row.jersey),
        position: non_empty(row.position),
        roster_status,
        team_id: row.team_id.filter(|id| *id != 0),
        team_name: non_empty(row.team_name),
        team_abbreviation: non_empty(row.team_abbreviation),
        team_city: non_empty(row.team_city),
        career_start_year: row.from_year,
        career_end_year: row.to_year,
        dleague: row.dleague_flag.as_deref().is_some_and(|flag| flag != "N"),
    })
}

fn game_summary_from_tables(tables: BoxScoreSummary) -> Result<GameSummary, AdapterError> {
    let BoxScoreSummary {
        summary,
        officials,
        line_score,
        last_meeting,
        game_info,
    } = tables;

    let row = summary.into_iter().next().ok_or(AdapterError::Incomplete {
        endpoint: Endpoint::BoxScoreSummary,
        table: "GameSummary",
    })?;

    let id = GameId::from(row.game_id);
    let points_for = |team_id: i64| {
        line_score
            .iter()
            .find(|line| line.team_id == team_id)
            .and_then(|line| line.points)
    };
    let info = game_info.into_iter().next().unwrap_or_default();

    let game = GameDetails {
        season: parse_season_column(&row.season)?,
        status: GameStatus::from_id(row.status_id),
        date: Some(parse_game_date(&row.game_date_est)?),
        home_team_id: row.home_team_id,
        visitor_team_id: row.visitor_team_id,
        home_points: points_for(row.home_team_id),
        visitor_points: points_for(row.visitor_team_id),
        attendance: info.attendance.filter(|a| *a > 0),
        length_minutes: info.game_time.as_deref().and_then(hours_minutes_to_minutes),
        last_meeting_game_id: last_meeting
            .into_iter()
            .next()
            .and_then(|m| non_empty(m.last_game_id))
            .map(GameId::from),
        national_tv: non_empty(row.national_tv),
        playoffs: id.is_playoff(),
        id,
    };

    Ok(GameSummary { game, officials })
}

fn shot_from_row(player_id: i64, row: ShotLogRow) -> Result<Shot, AdapterError> {
    let game_clock_seconds =
        clock_to_seconds(&row.game_clock).ok_or_else(|| AdapterError::InvalidValue {
            field: "GAME_CLOCK",
            value: row.game_clock.clone(),
        })?;

    Ok(Shot {
        game_id: GameId::from(row.game_id),
        player_id,
        number: row.shot_number,
        made: row.shot_result.trim().eq_ignore_ascii_case("made"),
        points: row.points,
        home: row.location.trim() == "H",
        period: row.period,
        game_clock_seconds,
        shot_clock: row.shot_clock,
        dribbles: row.dribbles,
        touch_time_seconds: row.touch_time,
        distance_feet: row.shot_distance,
        points_type: row.points_type,
        closest_defender_player_id: row.closest_defender_player_id,
        closest_defender_distance: row.closest_defender_distance,
        detail: None,
    })
}

fn event_from_row(row: PlayByPlayRow) -> Result<GameEvent, AdapterError> {
    let period_time_seconds =
        clock_to_seconds(&row.period_clock).ok_or_else(|| AdapterError::InvalidValue {
            field: "PCTIMESTRING",
            value: row.period_clock.clone(),
        })?;
    let [first, second, third] = &row.players;
    let player_ids = [first.player_id(), second.player_id(), third.player_id()];

    Ok(GameEvent {
        game_id: GameId::from(row.game_id),
        sequence: row.event_number,
        kind: EventKind::from_code(row.message_type),
        period: row.period,
        score: row.score.as_deref().and_then(parse_score),
        period_time_seconds,
        wall_clock: row.wall_clock,
        player_ids,
        home_description: non_empty(row.home_description),
        neutral_description: non_empty(row.neutral_description),
        visitor_description: non_empty(row.visitor_description),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixtureSource;
    use chrono::NaiveDate;
    use hoopsync_results::Response;

    const SUMMARY_JSON: &str = r#"{
        "resource": "boxscoresummary",
        "parameters": {"GameID": "0041400101"},
        "resultSets": [
            {"name": "GameSummary",
             "headers": ["GAME_DATE_EST", "GAME_SEQUENCE", "GAME_ID", "GAME_STATUS_ID", "GAME_STATUS_TEXT",
                         "GAMECODE", "HOME_TEAM_ID", "VISITOR_TEAM_ID", "SEASON", "LIVE_PERIOD",
                         "NATL_TV_BROADCASTER_ABBREVIATION"],
             "rowSet": [["2015-04-18T00:00:00", 1, "0041400101", 3, "Final", "20150418/BKNATL",
                         1610612737, 1610612751, "2014", 4, "ESPN"]]},
            {"name": "Officials",
             "headers": ["OFFICIAL_ID", "FIRST_NAME", "LAST_NAME", "JERSEY_NUM"],
             "rowSet": [[1151, "Scott", "Foster", "48 "], [1153, "Tony", "Brothers", "25"]]},
            {"name": "LineScore",
             "headers": ["GAME_DATE_EST", "GAME_SEQUENCE", "GAME_ID", "TEAM_ID", "PTS"],
             "rowSet": [["2015-04-18T00:00:00", 1, "0041400101", 1610612737, 99],
                        ["2015-04-18T00:00:00", 1, "0041400101", 1610612751, 92]]},
            {"name": "LastMeeting",
             "headers": ["GAME_ID", "LAST_GAME_ID"],
             "rowSet": [["0041400101", "0021401150"]]},
            {"name": "GameInfo",
             "headers": ["GAME_DATE", "ATTENDANCE", "GAME_TIME"],
             "rowSet": [["SATURDAY, APRIL 18, 2015", 18097, "2:19"]]}
        ]
    }"#;

    const PLAYER_INFO_JSON: &str = r#"{
        "resource": "commonplayerinfo",
        "parameters": {"PlayerID": 201566},
        "resultSets": [
            {"name": "CommonPlayerInfo",
             "headers": ["PERSON_ID", "FIRST_NAME", "LAST_NAME", "BIRTHDATE", "SCHOOL", "COUNTRY",
                         "LAST_AFFILIATION", "HEIGHT", "WEIGHT", "SEASON_EXP", "JERSEY", "POSITION",
                         "ROSTERSTATUS", "TEAM_ID", "TEAM_NAME", "TEAM_ABBREVIATION", "TEAM_CITY",
                         "FROM_YEAR", "TO_YEAR", "DLEAGUE_FLAG"],
             "rowSet": [[201566, "Russell", "Westbrook", "1988-11-12T00:00:00", "UCLA", "USA",
                         "UCLA/USA", "6-3", "200", 7, "0 ", "Guard", "Active", 1610612760, "Thunder",
                         "OKC", "Oklahoma City", 2008, 2014, "N"]]}
        ]
    }"#;

    fn api_with(fixture: &FixtureSource) -> StatsApi {
        StatsApi::new(Arc::new(fixture.clone()))
    }

    #[tokio::test]
    async fn game_summary_combines_tables() {
        let fixture = FixtureSource::new();
        let game_id = GameId::from("0041400101");
        fixture.respond(
            Endpoint::BoxScoreSummary,
            Params::new().with("GameID", &game_id),
            Response::from_slice(SUMMARY_JSON.as_bytes()).unwrap(),
        );

        let summary = api_with(&fixture).game_summary(&game_id).await.unwrap();
        let game = summary.game;
        assert_eq!(game.id, game_id);
        assert_eq!(game.season.to_string(), "2014-15");
        assert_eq!(game.status, GameStatus::Final);
        assert_eq!(game.date, NaiveDate::from_ymd_opt(2015, 4, 18));
        assert_eq!(game.home_points, Some(99));
        assert_eq!(game.visitor_points, Some(92));
        assert_eq!(game.attendance, Some(18097));
        assert_eq!(game.length_minutes, Some(139));
        assert_eq!(game.last_meeting_game_id, Some(GameId::from("0021401150")));
        assert_eq!(game.national_tv.as_deref(), Some("ESPN"));
        assert!(game.playoffs);

        assert_eq!(summary.officials.len(), 2);
        assert_eq!(summary.officials[0].jersey_number.as_deref(), Some("48"));
    }

    #[tokio::test]
    async fn empty_game_summary_is_incomplete() {
        let fixture = FixtureSource::new();
        let game_id = GameId::from("0021400001");
        fixture.respond(
            Endpoint::BoxScoreSummary,
            Params::new().with("GameID", &game_id),
            Response::from_slice(br#"{"resource": "boxscoresummary", "parameters": {}, "resultSets": []}"#)
                .unwrap(),
        );

        let err = api_with(&fixture).game_summary(&game_id).await.unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Incomplete {
                table: "GameSummary",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn player_details_convert_text_columns() {
        let fixture = FixtureSource::new();
        fixture.respond(
            Endpoint::CommonPlayerInfo,
            Params::new().with("LeagueID", LEAGUE_ID).with("PlayerID", 201566),
            Response::from_slice(PLAYER_INFO_JSON.as_bytes()).unwrap(),
        );

        let player = api_with(&fixture).player_details(201566).await.unwrap();
        assert_eq!(player.last_name, "Westbrook");
        assert_eq!(player.birthdate, NaiveDate::from_ymd_opt(1988, 11, 12));
        assert_eq!(player.height_inches, Some(75));
        assert_eq!(player.weight_pounds, Some(200));
        assert_eq!(player.jersey.as_deref(), Some("0"));
        assert_eq!(player.roster_status, RosterStatus::Active);
        assert_eq!(player.team_id, Some(1610612760));
        assert_eq!(player.career_start_year, Some(2008));
        assert!(!player.dleague);
    }

    #[tokio::test]
    async fn game_log_yields_ids_and_transport_errors_surface() {
        let fixture = FixtureSource::new();
        let season = Season::from_start_year(2014);
        let params = |season_type: SeasonType| {
            Params::new()
                .with("LeagueID", LEAGUE_ID)
                .with("Season", season)
                .with("SeasonType", season_type.as_param())
                .with("TeamID", 1610612737)
        };
        fixture.respond(
            Endpoint::TeamGameLog,
            params(SeasonType::RegularSeason),
            Response::from_slice(
                br#"{"resource": "teamgamelog", "parameters": {}, "resultSets": [
                    {"name": "TeamGameLog", "headers": ["Team_ID", "Game_ID", "GAME_DATE"],
                     "rowSet": [[1610612737, "0021401225", "APR 15, 2015"], [1610612737, "0021401201", "APR 13, 2015"]]}
                ]}"#,
            )
            .unwrap(),
        );
        fixture.fail(Endpoint::TeamGameLog, params(SeasonType::Playoffs), "boom");

        let api = api_with(&fixture);
        let ids = api
            .games_played_by(1610612737, season, SeasonType::RegularSeason)
            .await
            .unwrap();
        assert_eq!(ids, vec![GameId::from("0021401225"), GameId::from("0021401201")]);

        assert!(matches!(
            api.games_played_by(1610612737, season, SeasonType::Playoffs).await,
            Err(AdapterError::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn shot_log_converts_clock_and_result() {
        let fixture = FixtureSource::new();
        let season = Season::from_start_year(2014);
        fixture.respond(
            Endpoint::PlayerShotLog,
            Params::new()
                .with("LeagueID", LEAGUE_ID)
                .with("PlayerID", 2544)
                .with("Season", season)
                .with("SeasonType", SeasonType::RegularSeason.as_param()),
            Response::from_slice(
                br#"{"resource": "playerdashptshotlog", "parameters": {}, "resultSets": [
                    {"name": "PtShotLog",
                     "headers": ["GAME_ID", "MATCHUP", "LOCATION", "W", "FINAL_MARGIN", "SHOT_NUMBER",
                                 "PERIOD", "GAME_CLOCK", "SHOT_CLOCK", "DRIBBLES", "TOUCH_TIME", "SHOT_DIST",
                                 "PTS_TYPE", "SHOT_RESULT", "CLOSEST_DEFENDER", "CLOSEST_DEFENDER_PLAYER_ID",
                                 "CLOSE_DEF_DIST", "FGM", "PTS"],
                     "rowSet": [
                        ["0021400001", "CLE vs. NYK", "H", "L", -5, 1, 1, "11:01", 10.8, 2, 1.9, 7.7, 2,
                         "made", "Anthony, Carmelo", 2546, 1.3, 1, 2],
                        ["0021400001", "CLE vs. NYK", "H", "L", -5, 2, 1, "0:03", null, 0, 0.5, 25.1, 3,
                         "missed", "Smith, J.R.", 2747, 6.1, 0, 0]
                     ]}
                ]}"#,
            )
            .unwrap(),
        );

        let shots = api_with(&fixture)
            .player_shots(2544, season, SeasonType::RegularSeason)
            .await
            .unwrap();
        assert_eq!(shots.len(), 2);
        assert!(shots[0].made && shots[0].home);
        assert_eq!(shots[0].player_id, 2544);
        assert_eq!(shots[0].game_clock_seconds, 661);
        assert_eq!(shots[0].closest_defender_player_id, Some(2546));
        assert!(!shots[1].made);
        assert_eq!(shots[1].number, 2);
        assert_eq!(shots[1].shot_clock, None);
        assert_eq!(shots[1].points_type, 3);
    }

    #[tokio::test]
    async fn play_by_play_builds_events() {
        let fixture = FixtureSource::new();
        let game_id = GameId::from("0021400001");
        let season = Season::from_start_year(2014);
        fixture.respond(
            Endpoint::PlayByPlay,
            box_score_params(&game_id)
                .with("StartPeriod", 1)
                .with("RangeType", 2)
                .with("EndRange", 55800)
                .with("Season", season)
                .with("SeasonType", SeasonType::RegularSeason.as_param()),
            Response::from_slice(
                br#"{"resource": "playbyplay", "parameters": {}, "resultSets": [
                    {"name": "PlayByPlay",
                     "headers": ["GAME_ID", "EVENTNUM", "EVENTMSGTYPE", "EVENTMSGACTIONTYPE", "PERIOD",
                                 "WCTIMESTRING", "PCTIMESTRING", "HOMEDESCRIPTION", "NEUTRALDESCRIPTION",
                                 "VISITORDESCRIPTION", "SCORE", "SCOREMARGIN", "PLAYER1_ID", "PLAYER1_NAME",
                                 "PLAYER1_TEAM_ID", "PLAYER2_ID", "PLAYER2_NAME", "PLAYER2_TEAM_ID",
                                 "PLAYER3_ID", "PLAYER3_NAME", "PLAYER3_TEAM_ID"],
                     "rowSet": [
                        ["0021400001", 0, 12, 0, 1, "8:11 PM", "12:00", null, null, null, null, null,
                         0, null, null, 0, null, null, 0, null, null],
                        ["0021400001", 4, 1, 5, 1, "8:12 PM", "11:36", "James 1' Layup (2 PTS)", null, null,
                         "2 - 0", "2", 2544, "LeBron James", 1610612739, 2747, "J.R. Smith", 1610612739,
                         0, null, null]
                     ]}
                ]}"#,
            )
            .unwrap(),
        );

        let events = api_with(&fixture)
            .play_by_play(&game_id, season)
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::PeriodStart);
        assert_eq!(events[0].score, None);
        assert_eq!(events[0].player_ids, [None, None, None]);
        assert_eq!(events[1].sequence, 4);
        assert_eq!(events[1].period_time_seconds, 696);
        assert_eq!(events[1].score.map(|s| (s.home, s.visitor)), Some((2, 0)));
        assert_eq!(events[1].player_ids, [Some(2544), Some(2747), None]);
        assert_eq!(events[1].wall_clock, "8:12 PM");
    }

    #[test]
    fn player_rows_tolerate_missing_text() {
        let details = player_details_from_row(PlayerInfoRow {
            person_id: 1,
            first_name: "A".into(),
            last_name: "B".into(),
            team_id: Some(0),
            dleague_flag: Some("Y".into()),
            school: Some("  ".into()),
            ..PlayerInfoRow::default()
        })
        .unwrap();
        assert_eq!(details.birthdate, None);
        assert_eq!(details.team_id, None);
        assert_eq!(details.school, None);
        assert!(details.dleague);

        assert!(player_details_from_row(PlayerInfoRow {
            birthdate: Some("yesterday".into()),
            ..PlayerInfoRow::default()
        })
        .is_err());
    }
}
