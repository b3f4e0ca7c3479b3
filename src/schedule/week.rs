use super::LEAGUE_TZ;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};

/// 18 regular-season weeks plus four playoff rounds
pub const LAST_WEEK: u8 = 22;

/// Season year a game belongs to. January and February playoff games
/// belong to the season that started the previous autumn.
pub fn season_year(date: NaiveDate) -> i32 {
    if date.month() >= 3 {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Maps calendar dates onto NFL weeks. A week runs Tuesday through Monday,
/// starting with the Tuesday opening-line collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonCalendar {
    opener: NaiveDate,
}

impl SeasonCalendar {
    /// `opener` is the kickoff date of the first game of week 1
    pub fn new(opener: NaiveDate) -> Self {
        Self { opener }
    }

    pub fn week_one_start(&self) -> NaiveDate {
        let weekday = self.opener.weekday().num_days_from_monday();
        let days_since_tuesday = (weekday + 7 - Weekday::Tue.num_days_from_monday()) % 7;
        self.opener - Duration::days(days_since_tuesday as i64)
    }

    pub fn week_of(&self, date: NaiveDate) -> Option<u8> {
        let days = (date - self.week_one_start()).num_days();
        if days < 0 {
            return None;
        }

        let week = days / 7 + 1;
        if week > LAST_WEEK as i64 {
            None
        } else {
            Some(week as u8)
        }
    }

    /// UTC kickoff range `[from, to)` covering `week`, Tuesday midnight to
    /// Tuesday midnight in league time
    pub fn week_bounds(&self, week: u8) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if week == 0 || week > LAST_WEEK {
            return None;
        }

        let start = self.week_one_start() + Duration::weeks(week as i64 - 1);
        let end = start + Duration::weeks(1);

        let to_utc = |date: NaiveDate| {
            LEAGUE_TZ
                .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        };

        Some((to_utc(start)?, to_utc(end)?))
    }
}
