use super::{parse_commence_time, LEAGUE_TZ};
use crate::models::RawGame;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Weekday};
use tracing::{debug, info, warn};

/// Latest UTC hour on Friday that still counts as a Thursday night kickoff
const TNF_ROLLOVER_HOUR_UTC: u32 = 6;

/// Games kept for a closing-line snapshot, plus how many were unreadable
#[derive(Debug, Clone, Default)]
pub struct TodaysGames {
    pub games: Vec<RawGame>,
    pub skipped: usize,
}

/// Keep the games played "today" relative to `now` (league-local wall clock).
///
/// A game belongs to today when its kickoff falls on today's date in league
/// time. On Thursdays, kickoffs early on Friday UTC (before 06:00) are also
/// kept since those are Thursday Night Football in US time.
pub fn filter_today(games: &[RawGame], now: NaiveDateTime) -> TodaysGames {
    let today = now.date();
    let is_thursday = today.weekday() == Weekday::Thu;
    let mut result = TodaysGames::default();

    debug!("Looking for games on {} ({})", today, today.weekday());

    for game in games {
        let kickoff = match parse_commence_time(game.commence_time.as_deref()) {
            Ok(kickoff) => kickoff,
            Err(e) => {
                warn!("Skipping {} @ {}: {}", game.away_team, game.home_team, e);
                result.skipped += 1;
                continue;
            }
        };

        let local_date = kickoff.with_timezone(&LEAGUE_TZ).date_naive();
        let thursday_night = is_thursday
            && kickoff.date_naive() == today + Duration::days(1)
            && kickoff.hour() < TNF_ROLLOVER_HOUR_UTC;

        if local_date == today || thursday_night {
            debug!(
                "Found game: {} @ {} at {}",
                game.away_team,
                game.home_team,
                kickoff.format("%A %H:%M UTC")
            );
            result.games.push(game.clone());
        }
    }

    if result.games.is_empty() {
        info!("No games found for {}", today.weekday());
    } else {
        info!("Found {} games for {}", result.games.len(), today.weekday());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn game(away: &str, home: &str, commence_time: Option<&str>) -> RawGame {
        RawGame {
            id: format!("{}-{}", away, home),
            home_team: home.to_string(),
            away_team: away.to_string(),
            commence_time: commence_time.map(str::to_string),
            ..Default::default()
        }
    }

    fn local(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    // Thursday 20:30 EDT
    fn thursday_night() -> RawGame {
        game("Dallas Cowboys", "Philadelphia Eagles", Some("2025-09-05T00:30:00Z"))
    }

    #[test]
    fn test_thursday_night_rollover_included_on_thursday() {
        let games = vec![thursday_night()];

        // Thursday Sep 4, afternoon
        let kept = filter_today(&games, local(4, 16));
        assert_eq!(kept.games.len(), 1);
        assert_eq!(kept.skipped, 0);
    }

    #[test]
    fn test_thursday_night_rollover_excluded_on_friday() {
        let games = vec![thursday_night()];

        let kept = filter_today(&games, local(5, 16));
        assert!(kept.games.is_empty());
    }

    #[test]
    fn test_late_friday_utc_not_treated_as_thursday_night() {
        // 07:00 UTC Friday is 03:00 EDT Friday
        let games = vec![game(
            "Kansas City Chiefs",
            "Los Angeles Chargers",
            Some("2025-09-05T07:00:00Z"),
        )];

        let kept = filter_today(&games, local(4, 16));
        assert!(kept.games.is_empty());
    }

    #[test]
    fn test_sunday_slate() {
        let games = vec![
            game("Pittsburgh Steelers", "New York Jets", Some("2025-09-07T17:00:00Z")),
            game("Baltimore Ravens", "Buffalo Bills", Some("2025-09-08T00:20:00Z")),
            game("Minnesota Vikings", "Chicago Bears", Some("2025-09-09T00:15:00Z")),
        ];

        let kept = filter_today(&games, local(7, 9));
        let homes: Vec<&str> = kept.games.iter().map(|g| g.home_team.as_str()).collect();

        // The Sunday night game kicks off after midnight UTC but is still Sunday
        assert_eq!(homes, vec!["New York Jets", "Buffalo Bills"]);
    }

    #[test]
    fn test_unparsable_times_are_skipped() {
        let games = vec![
            game("Dallas Cowboys", "Philadelphia Eagles", None),
            game("Kansas City Chiefs", "Los Angeles Chargers", Some("TBD")),
            game("Pittsburgh Steelers", "New York Jets", Some("2025-09-07T17:00:00Z")),
        ];

        let kept = filter_today(&games, local(7, 9));
        assert_eq!(kept.games.len(), 1);
        assert_eq!(kept.skipped, 2);
    }
}
