use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hoopsync_results::Response;
use hoopsync_storage::HttpFetcher;
use tracing::debug;

use crate::AdapterError;

/// Upstream resources this crate knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    FranchiseHistory,
    CommonAllPlayers,
    CommonPlayerInfo,
    TeamGameLog,
    BoxScoreSummary,
    BoxScoreTraditional,
    PlayerShotLog,
    ShotChartDetail,
    PlayByPlay,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::FranchiseHistory => "franchisehistory",
            Self::CommonAllPlayers => "commonallplayers",
            Self::CommonPlayerInfo => "commonplayerinfo",
            Self::TeamGameLog => "teamgamelog",
            Self::BoxScoreSummary => "boxscoresummaryv2",
            Self::BoxScoreTraditional => "boxscoretraditionalv2",
            Self::PlayerShotLog => "playerdashptshotlog",
            Self::ShotChartDetail => "shotchartdetail",
            Self::PlayByPlay => "playbyplayv2",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Query parameters, kept sorted so equal requests compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Anything that can answer an endpoint request with a decoded envelope.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch(&self, endpoint: Endpoint, params: &Params) -> Result<Response, AdapterError>;
}

/// Issues `GET {base_url}/{endpoint}?{params}` through the shared [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpStatsSource {
    fetcher: Arc<HttpFetcher>,
    base_url: String,
}

impl HttpStatsSource {
    pub fn new(fetcher: Arc<HttpFetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint.path())
    }
}

#[async_trait]
impl StatsSource for HttpStatsSource {
    async fn fetch(&self, endpoint: Endpoint, params: &Params) -> Result<Response, AdapterError> {
        let url = self.endpoint_url(endpoint);
        let fetched = self.fetcher.fetch_bytes(&url, &params.to_pairs()).await?;
        debug!(%endpoint, bytes = fetched.body.len(), "decoding envelope");
        Ok(Response::from_slice(&fetched.body)?)
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Respond(Response),
    Fail(String),
}

#[derive(Debug, Default)]
struct FixtureState {
    scripts: HashMap<(Endpoint, Params), Scripted>,
    calls: HashMap<Endpoint, usize>,
}

/// Canned, in-process [`StatsSource`] answering from pre-recorded envelopes.
///
/// Requests without a script are rejected. Scripts may be replaced while the
/// source is shared, so one fixture can model upstream data changing between runs.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    state: Arc<Mutex<FixtureState>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, endpoint: Endpoint, params: Params, response: Response) -> &Self {
        self.script(endpoint, params, Scripted::Respond(response))
    }

    pub fn fail(&self, endpoint: Endpoint, params: Params, message: impl Into<String>) -> &Self {
        self.script(endpoint, params, Scripted::Fail(message.into()))
    }

    /// Number of requests made against `endpoint`, scripted or not.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.get(&endpoint).copied().unwrap_or(0)
    }

    fn script(&self, endpoint: Endpoint, params: Params, scripted: Scripted) -> &Self {
        self.lock().scripts.insert((endpoint, params), scripted);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FixtureState> {
        // A panic while holding this lock cannot leave the maps half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StatsSource for FixtureSource {
    async fn fetch(&self, endpoint: Endpoint, params: &Params) -> Result<Response, AdapterError> {
        let scripted = {
            let mut state = self.lock();
            *state.calls.entry(endpoint).or_default() += 1;
            state.scripts.get(&(endpoint, params.clone())).cloned()
        };
        match scripted {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(AdapterError::Rejected { endpoint, message }),
            None => Err(AdapterError::Rejected {
                endpoint,
                message: format!("no fixture for {params:?}"),
            }),
        }
    }
}
