//! Scripted upstream used by the orchestrator and scheduler tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use hoopsync_adapters::{AdapterError, Endpoint, Params, StatsSource};
use hoopsync_core::SeasonType;
use hoopsync_results::{Response, ResultTable, Scalar};

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScriptedGame {
    status: i64,
    home: i64,
    visitor: i64,
    points: Option<i32>,
}

impl ScriptedGame {
    pub(crate) fn final_score(home: i64, visitor: i64, points: i32) -> Self {
        Self {
            status: 3,
            home,
            visitor,
            points: Some(points),
        }
    }

    pub(crate) fn live(home: i64, visitor: i64) -> Self {
        Self {
            status: 2,
            home,
            visitor,
            points: None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedSource {
    teams: Vec<(i64, &'static str, &'static str)>,
    logs: HashMap<(i64, &'static str), Vec<&'static str>>,
    failing_logs: HashSet<i64>,
    players: Vec<i64>,
    failing_players: HashSet<i64>,
    games: Mutex<HashMap<String, ScriptedGame>>,
    officials: HashMap<&'static str, Vec<i64>>,
    /// `(player_id, game_id) -> attempts`
    shots: Vec<(i64, &'static str, usize)>,
    failing_shots: HashSet<i64>,
    calls: Mutex<HashMap<Endpoint, usize>>,
    spans: Mutex<HashMap<Endpoint, HashSet<Option<tracing::Id>>>>,
    requests: Mutex<Vec<(Endpoint, Params)>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn team(mut self, id: i64, city: &'static str, name: &'static str) -> Self {
        self.teams.push((id, city, name));
        self
    }

    pub(crate) fn game_log(
        mut self,
        team_id: i64,
        season_type: SeasonType,
        ids: &[&'static str],
    ) -> Self {
        self.logs
            .insert((team_id, season_type.as_param()), ids.to_vec());
        self
    }

    pub(crate) fn failing_log(mut self, team_id: i64) -> Self {
        self.failing_logs.insert(team_id);
        self
    }

    pub(crate) fn player(mut self, id: i64) -> Self {
        self.players.push(id);
        self
    }

    pub(crate) fn failing_player(mut self, id: i64) -> Self {
        self.failing_players.insert(id);
        self
    }

    pub(crate) fn game(self, id: &str, game: ScriptedGame) -> Self {
        self.games.lock().unwrap().insert(id.to_string(), game);
        self
    }

    /// Officials listed for `game_id`, in upstream order. Defaults to one official, 100.
    pub(crate) fn officials(mut self, game_id: &'static str, ids: &[i64]) -> Self {
        self.officials.insert(game_id, ids.to_vec());
        self
    }

    /// `count` regular-season attempts by `player_id` in `game_id`.
    pub(crate) fn shots(mut self, player_id: i64, game_id: &'static str, count: usize) -> Self {
        self.shots.push((player_id, game_id, count));
        self
    }

    pub(crate) fn failing_shots(mut self, player_id: i64) -> Self {
        self.failing_shots.insert(player_id);
        self
    }

    pub(crate) fn set_points(&self, id: &str, points: i32) {
        if let Some(game) = self.games.lock().unwrap().get_mut(id) {
            game.points = Some(points);
        }
    }

    pub(crate) fn finish_game(&self, id: &str, points: i32) {
        if let Some(game) = self.games.lock().unwrap().get_mut(id) {
            game.status = 3;
            game.points = Some(points);
        }
    }

    pub(crate) fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&endpoint)
            .copied()
            .unwrap_or(0)
    }

    /// Parameters of every request to `endpoint`, in call order.
    pub(crate) fn requests(&self, endpoint: Endpoint) -> Vec<Params> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(seen, _)| *seen == endpoint)
            .map(|(_, params)| params.clone())
            .collect()
    }

    /// Span ids current when `endpoint` was requested.
    pub(crate) fn spans(&self, endpoint: Endpoint) -> HashSet<Option<tracing::Id>> {
        self.spans
            .lock()
            .unwrap()
            .get(&endpoint)
            .cloned()
            .unwrap_or_default()
    }

    fn id_param(params: &Params, key: &str) -> i64 {
        params
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    fn game_for(&self, endpoint: Endpoint, params: &Params) -> Result<(String, ScriptedGame), AdapterError> {
        let id = params.get("GameID").unwrap_or_default().to_string();
        let game = self.games.lock().unwrap().get(&id).copied();
        game.map(|g| (id.clone(), g)).ok_or(AdapterError::Rejected {
            endpoint,
            message: format!("unknown game {id}"),
        })
    }
}

fn boom(endpoint: Endpoint) -> AdapterError {
    AdapterError::Rejected {
        endpoint,
        message: "boom".to_string(),
    }
}

fn row(cells: Vec<Scalar>) -> Vec<Scalar> {
    cells
}

#[async_trait]
impl StatsSource for ScriptedSource {
    async fn fetch(&self, endpoint: Endpoint, params: &Params) -> Result<Response, AdapterError> {
        *self.calls.lock().unwrap().entry(endpoint).or_default() += 1;
        self.requests.lock().unwrap().push((endpoint, params.clone()));
        self.spans
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .insert(tracing::Span::current().id());
        tokio::task::yield_now().await;

        let tables = match endpoint {
            Endpoint::FranchiseHistory => vec![ResultTable::new(
                "FranchiseHistory",
                [
                    "TEAM_ID", "TEAM_CITY", "TEAM_NAME", "START_YEAR", "END_YEAR", "GAMES", "WINS",
                    "LOSSES",
                ],
                self.teams
                    .iter()
                    .map(|(id, city, name)| {
                        row(vec![
                            (*id).into(),
                            (*city).into(),
                            (*name).into(),
                            "1949".into(),
                            "2015".into(),
                            82i64.into(),
                            41i64.into(),
                            41i64.into(),
                        ])
                    })
                    .collect(),
            )],
            Endpoint::CommonAllPlayers => vec![ResultTable::new(
                "CommonAllPlayers",
                ["PERSON_ID", "DISPLAY_LAST_COMMA_FIRST", "ROSTERSTATUS"],
                self.players
                    .iter()
                    .map(|id| row(vec![(*id).into(), format!("Player, {id}").into(), 1i64.into()]))
                    .collect(),
            )],
            Endpoint::CommonPlayerInfo => {
                let id: i64 = params
                    .get("PlayerID")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default();
                if self.failing_players.contains(&id) {
                    return Err(boom(endpoint));
                }
                vec![ResultTable::new(
                    "CommonPlayerInfo",
                    ["PERSON_ID", "FIRST_NAME", "LAST_NAME", "ROSTERSTATUS"],
                    vec![row(vec![
                        id.into(),
                        "First".into(),
                        format!("Last{id}").into(),
                        "Active".into(),
                    ])],
                )]
            }
            Endpoint::TeamGameLog => {
                let team_id: i64 = params
                    .get("TeamID")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default();
                if self.failing_logs.contains(&team_id) {
                    return Err(boom(endpoint));
                }
                let season_type = params.get("SeasonType").unwrap_or_default();
                let ids = self
                    .logs
                    .iter()
                    .find(|((team, kind), _)| *team == team_id && *kind == season_type)
                    .map(|(_, ids)| ids.clone())
                    .unwrap_or_default();
                vec![ResultTable::new(
                    "TeamGameLog",
                    ["Team_ID", "Game_ID"],
                    ids.into_iter()
                        .map(|id| row(vec![team_id.into(), id.into()]))
                        .collect(),
                )]
            }
            Endpoint::BoxScoreSummary => {
                let (id, game) = self.game_for(endpoint, params)?;
                vec![
                    ResultTable::new(
                        "GameSummary",
                        [
                            "GAME_DATE_EST",
                            "GAME_ID",
                            "GAME_STATUS_ID",
                            "HOME_TEAM_ID",
                            "VISITOR_TEAM_ID",
                            "SEASON",
                        ],
                        vec![row(vec![
                            "2015-01-01T00:00:00".into(),
                            id.as_str().into(),
                            game.status.into(),
                            game.home.into(),
                            game.visitor.into(),
                            "2014".into(),
                        ])],
                    ),
                    ResultTable::new(
                        "Officials",
                        ["OFFICIAL_ID", "FIRST_NAME", "LAST_NAME", "JERSEY_NUM"],
                        self.officials
                            .get(id.as_str())
                            .cloned()
                            .unwrap_or_else(|| vec![100])
                            .into_iter()
                            .map(|official| {
                                row(vec![
                                    official.into(),
                                    "Ref".into(),
                                    format!("Number{official}").into(),
                                    official.to_string().into(),
                                ])
                            })
                            .collect(),
                    ),
                    ResultTable::new(
                        "LineScore",
                        ["TEAM_ID", "PTS"],
                        vec![
                            row(vec![game.home.into(), game.points.into()]),
                            row(vec![game.visitor.into(), game.points.map(|p| p - 3).into()]),
                        ],
                    ),
                ]
            }
            Endpoint::BoxScoreTraditional => {
                let (_, game) = self.game_for(endpoint, params)?;
                let points = game.points.unwrap_or_default();
                vec![
                    ResultTable::new(
                        "TeamStats",
                        ["TEAM_ID", "TEAM_NAME", "MIN", "PTS"],
                        vec![
                            row(vec![game.home.into(), "Home".into(), "240:00".into(), points.into()]),
                            row(vec![
                                game.visitor.into(),
                                "Visitor".into(),
                                "240:00".into(),
                                (points - 3).into(),
                            ]),
                        ],
                    ),
                    ResultTable::new(
                        "PlayerStats",
                        ["PLAYER_ID", "PLAYER_NAME", "TEAM_ID", "MIN", "PTS"],
                        [game.home, game.visitor]
                            .into_iter()
                            .map(|team| {
                                row(vec![
                                    (team * 100 + 1).into(),
                                    "Starter".into(),
                                    team.into(),
                                    "36:00".into(),
                                    (points / 4).into(),
                                ])
                            })
                            .collect(),
                    ),
                ]
            }
            Endpoint::PlayerShotLog => {
                let player_id = Self::id_param(params, "PlayerID");
                if self.failing_shots.contains(&player_id) {
                    return Err(boom(endpoint));
                }
                let regular = params.get("SeasonType") == Some(SeasonType::RegularSeason.as_param());
                vec![ResultTable::new(
                    "PtShotLog",
                    [
                        "GAME_ID", "LOCATION", "SHOT_NUMBER", "PERIOD", "GAME_CLOCK", "SHOT_RESULT",
                        "PTS_TYPE", "PTS",
                    ],
                    self.shots
                        .iter()
                        .filter(|(player, _, _)| regular && *player == player_id)
                        .flat_map(|(_, game, count)| {
                            (1..=*count).map(move |number| {
                                row(vec![
                                    (*game).into(),
                                    "H".into(),
                                    (number as i64).into(),
                                    1i64.into(),
                                    format!("{}:00", 12 - number.min(12)).into(),
                                    (if number % 2 == 1 { "made" } else { "missed" }).into(),
                                    2i64.into(),
                                    (if number % 2 == 1 { 2i64 } else { 0i64 }).into(),
                                ])
                            })
                        })
                        .collect(),
                )]
            }
            Endpoint::ShotChartDetail => {
                let player_id = Self::id_param(params, "PlayerID");
                let game_id = params.get("GameID").unwrap_or_default();
                let count = self
                    .shots
                    .iter()
                    .find(|(player, game, _)| *player == player_id && *game == game_id)
                    .map_or(0, |(_, _, count)| *count);
                // Latest attempt first, so callers must put rows in game order.
                vec![ResultTable::new(
                    "Shot_Chart_Detail",
                    [
                        "GAME_ID", "GAME_EVENT_ID", "PLAYER_ID", "PERIOD", "MINUTES_REMAINING",
                        "SECONDS_REMAINING", "ACTION_TYPE", "SHOT_ZONE_BASIC", "SHOT_ZONE_AREA",
                        "LOC_X", "LOC_Y",
                    ],
                    (1..=count)
                        .rev()
                        .map(|number| {
                            row(vec![
                                game_id.into(),
                                (number as i64 * 10).into(),
                                player_id.into(),
                                1i64.into(),
                                (12 - number.min(12) as i64).into(),
                                0i64.into(),
                                format!("Shot {number}").into(),
                                "Mid-Range".into(),
                                "Center(C)".into(),
                                (number as i64).into(),
                                (number as i64 * 10).into(),
                            ])
                        })
                        .collect(),
                )]
            }
            Endpoint::PlayByPlay => {
                let (id, game) = self.game_for(endpoint, params)?;
                vec![ResultTable::new(
                    "PlayByPlay",
                    [
                        "GAME_ID", "EVENTNUM", "EVENTMSGTYPE", "PERIOD", "WCTIMESTRING", "PCTIMESTRING",
                        "HOMEDESCRIPTION", "SCORE", "PLAYER1_ID", "PLAYER1_NAME", "PLAYER1_TEAM_ID",
                    ],
                    vec![
                        row(vec![
                            id.as_str().into(),
                            0i64.into(),
                            12i64.into(),
                            1i64.into(),
                            "7:00 PM".into(),
                            "12:00".into(),
                            Scalar::Null,
                            Scalar::Null,
                            0i64.into(),
                            Scalar::Null,
                            Scalar::Null,
                        ]),
                        row(vec![
                            id.as_str().into(),
                            2i64.into(),
                            1i64.into(),
                            1i64.into(),
                            "7:01 PM".into(),
                            "11:40".into(),
                            "Layup".into(),
                            "2 - 0".into(),
                            (game.home * 100 + 1).into(),
                            "Starter".into(),
                            game.home.into(),
                        ]),
                    ],
                )]
            }
        };

        Ok(Response::from_tables(endpoint.path(), tables))
    }
}
