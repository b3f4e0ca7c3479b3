use crate::models::SnapshotKind;
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;

pub const SNAPSHOT_COUNT: u8 = 6;

/// Whether a window was matched on schedule or guessed from the day alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMatch {
    Scheduled,
    Fallback,
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotWindow {
    pub number: u8,
    pub kind: SnapshotKind,
    pub matched: WindowMatch,
}

impl SnapshotWindow {
    fn new(number: u8, matched: WindowMatch) -> Self {
        Self {
            number,
            kind: SnapshotKind::for_snapshot(number),
            matched,
        }
    }

    /// Collect as a specific snapshot regardless of the clock
    pub fn forced(number: u8) -> Option<Self> {
        (1..=SNAPSHOT_COUNT)
            .contains(&number)
            .then(|| Self::new(number, WindowMatch::Forced))
    }

    pub fn description(&self) -> &'static str {
        snapshot_description(self.number)
    }
}

pub fn snapshot_description(number: u8) -> &'static str {
    match number {
        1 => "Tuesday Opening Lines",
        2 => "Thursday Night Football Final Lines",
        3 => "Friday Final Lines",
        4 => "Saturday Final Lines",
        5 => "Sunday Final Lines",
        6 => "Monday Night Football Final Lines",
        _ => "Unknown Snapshot",
    }
}

struct WindowRule {
    day: Weekday,
    opens: u32,
    closes: Option<u32>,
    number: u8,
    label: &'static str,
}

impl WindowRule {
    fn contains(&self, day: Weekday, hour: u32) -> bool {
        day == self.day && hour >= self.opens && self.closes.map_or(true, |closes| hour < closes)
    }

    /// Hours since Tuesday 00:00 at which the window opens
    fn opens_at(&self) -> u32 {
        week_position(self.day) * 24 + self.opens
    }
}

// In week order, Tuesday first
const WINDOWS: [WindowRule; 6] = [
    WindowRule {
        day: Weekday::Tue,
        opens: 10,
        closes: None,
        number: 1,
        label: "Next Tuesday 10 AM+ (Snapshot 1 - Opening Lines)",
    },
    WindowRule {
        day: Weekday::Thu,
        opens: 15,
        closes: None,
        number: 2,
        label: "Next Thursday 3 PM+ (Snapshot 2 - Thursday Night Football)",
    },
    WindowRule {
        day: Weekday::Fri,
        opens: 15,
        closes: None,
        number: 3,
        label: "Next Friday 3 PM+ (Snapshot 3 - Friday Games if any)",
    },
    WindowRule {
        day: Weekday::Sat,
        opens: 10,
        closes: None,
        number: 4,
        label: "Next Saturday 10 AM+ (Snapshot 4 - Saturday Games)",
    },
    WindowRule {
        day: Weekday::Sun,
        opens: 8,
        closes: Some(13),
        number: 5,
        label: "Next Sunday 8 AM-1 PM (Snapshot 5 - Sunday Games)",
    },
    WindowRule {
        day: Weekday::Mon,
        opens: 15,
        closes: None,
        number: 6,
        label: "Next Monday 3 PM+ (Snapshot 6 - Monday Night Football)",
    },
];

const NEW_WEEK_LABEL: &str = "Next Tuesday 10 AM+ (Snapshot 1 - New Week Opening Lines)";

/// Days since Tuesday; the collection week runs Tuesday through Monday
fn week_position(day: Weekday) -> u32 {
    (day.num_days_from_monday() + 6) % 7
}

/// Best-guess snapshot when no window is open. Monday before the MNF window
/// has no sensible guess.
fn fallback_snapshot(day: Weekday) -> Option<u8> {
    match day {
        Weekday::Tue => Some(1),
        Weekday::Wed | Weekday::Thu => Some(2),
        Weekday::Fri => Some(3),
        Weekday::Sat => Some(4),
        Weekday::Sun => Some(5),
        Weekday::Mon => None,
    }
}

/// Decide which snapshot is due at `now` (league-local wall clock).
pub fn resolve(now: NaiveDateTime) -> Option<SnapshotWindow> {
    let day = now.weekday();
    let hour = now.hour();

    if let Some(rule) = WINDOWS.iter().find(|rule| rule.contains(day, hour)) {
        return Some(SnapshotWindow::new(rule.number, WindowMatch::Scheduled));
    }

    fallback_snapshot(day).map(|number| SnapshotWindow::new(number, WindowMatch::Fallback))
}

/// Human-readable label of the next window to open after `now`
pub fn next_window_description(now: NaiveDateTime) -> &'static str {
    let hours_into_week = week_position(now.weekday()) * 24 + now.hour();

    WINDOWS
        .iter()
        .find(|rule| rule.opens_at() > hours_into_week)
        .map(|rule| rule.label)
        .unwrap_or(NEW_WEEK_LABEL)
}
