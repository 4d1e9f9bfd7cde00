//! Upstream stats service: transport-agnostic source contract, endpoint row
//! schemas, and the typed [`StatsApi`] client built on top of them.

mod api;
mod convert;
pub mod endpoints;
mod source;

use hoopsync_results::DecodeError;
use hoopsync_storage::FetchError;
use thiserror::Error;

pub use api::{GameSummary, StatsApi};
pub use convert::{
    clock_to_seconds, hours_minutes_to_minutes, minutes_to_seconds, parse_birthdate,
    parse_game_date, parse_height_inches, parse_score, parse_season_column,
};
pub use source::{Endpoint, FixtureSource, HttpStatsSource, Params, StatsSource};

pub const CRATE_NAME: &str = "hoopsync-adapters";

/// League identifier for the NBA proper.
pub const LEAGUE_ID: &str = "00";

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] FetchError),
    #[error("{endpoint} rejected request: {message}")]
    Rejected {
        endpoint: Endpoint,
        message: String,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("{endpoint} returned no {table} row")]
    Incomplete {
        endpoint: Endpoint,
        table: &'static str,
    },
    #[error("invalid {field} value `{value}`")]
    InvalidValue { field: &'static str, value: String },
}
