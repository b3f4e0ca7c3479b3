//! Weekly collection calendar: which snapshot is due, which games count as
//! "today", and which NFL week a date falls in.
//!
//! All day and hour rules are evaluated in US Eastern time, the zone the NFL
//! schedules in, regardless of the host's locale.

pub mod game_day;
pub mod week;
pub mod window;

pub use game_day::*;
pub use week::*;
pub use window::*;

use crate::error::MalformedRecord;
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

pub const LEAGUE_TZ: Tz = chrono_tz::America::New_York;

/// Wall-clock time in the league time zone
pub fn league_now(now: DateTime<Utc>) -> NaiveDateTime {
    now.with_timezone(&LEAGUE_TZ).naive_local()
}

/// Parse a game's `commence_time`. Values without an offset are taken as UTC.
pub fn parse_commence_time(raw: Option<&str>) -> Result<DateTime<Utc>, MalformedRecord> {
    let raw = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Err(MalformedRecord::MissingCommenceTime),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| MalformedRecord::CommenceTime(raw.to_string()))
}
