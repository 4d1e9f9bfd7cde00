use chrono::{NaiveDate, NaiveDateTime};
use hoopsync_core::{Score, Season};

use crate::AdapterError;

const BIRTHDATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Minutes played as reported in box scores: `"34:12"`, `"34"` or
/// `"34.000000:12"`. Anything unreadable counts as zero.
pub fn minutes_to_seconds(value: &str) -> i32 {
    let value = value.trim();
    let (minutes, seconds) = value.split_once(':').unwrap_or((value, "0"));
    let minutes = minutes.trim().parse::<f64>().ok();
    let seconds = seconds.trim().parse::<i32>().ok();
    match (minutes, seconds) {
        (Some(m), Some(s)) if m >= 0.0 && s >= 0 => (m.trunc() as i32) * 60 + s,
        _ => 0,
    }
}

/// Game length as `"H:MM"` into whole minutes.
pub fn hours_minutes_to_minutes(value: &str) -> Option<i32> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    Some(hours * 60 + minutes)
}

pub fn parse_birthdate(value: &str) -> Result<Option<NaiveDate>, AdapterError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(value, BIRTHDATE_FORMAT)
        .map(|dt| Some(dt.date()))
        .map_err(|_| AdapterError::InvalidValue {
            field: "BIRTHDATE",
            value: value.to_string(),
        })
}

/// `"6-10"` into 82. Missing or partial heights are unknown.
pub fn parse_height_inches(value: &str) -> Option<i32> {
    let (feet, inches) = value.trim().split_once('-')?;
    let feet: i32 = feet.parse().ok()?;
    let inches: i32 = inches.parse().ok()?;
    Some(feet * 12 + inches)
}

/// `GAME_DATE_EST` values look like `2015-04-15T00:00:00`.
pub fn parse_game_date(value: &str) -> Result<NaiveDate, AdapterError> {
    let invalid = || AdapterError::InvalidValue {
        field: "GAME_DATE_EST",
        value: value.to_string(),
    };
    let day = value.trim().get(..10).ok_or_else(invalid)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| invalid())
}

/// The summary `SEASON` column carries the fall year (`"2014"`); the
/// `"2014-15"` spelling is accepted as well.
pub fn parse_season_column(value: &str) -> Result<Season, AdapterError> {
    let value = value.trim();
    if value.len() == 4 {
        if let Ok(year) = value.parse::<i32>() {
            return Ok(Season::from_start_year(year));
        }
    }
    value.parse().map_err(|_| AdapterError::InvalidValue {
        field: "SEASON",
        value: value.to_string(),
    })
}

/// Period clock `"M:SS"` into seconds left.
pub fn clock_to_seconds(value: &str) -> Option<i32> {
    let (minutes, seconds) = value.trim().split_once(':')?;
    let minutes: i32 = minutes.trim().parse().ok()?;
    let seconds: i32 = seconds.trim().parse().ok()?;
    (minutes >= 0 && (0..60).contains(&seconds)).then_some(minutes * 60 + seconds)
}

/// Play-by-play `SCORE` column, home score first: `"94 - 97"`.
pub fn parse_score(value: &str) -> Option<Score> {
    let (home, visitor) = value.split_once('-')?;
    Some(Score {
        home: home.trim().parse().ok()?,
        visitor: visitor.trim().parse().ok()?,
    })
}
