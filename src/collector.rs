use crate::api::OddsSource;
use crate::error::{no_games_message, CollectionError, Stage};
use crate::models::{
    CollectionResult, GameSummary, RawGame, RawPropOutcome, SkippedRecords, SnapshotKind,
};
use crate::schedule::{
    filter_today, league_now, next_window_description, resolve, SeasonCalendar, SnapshotWindow,
    TodaysGames, LAST_WEEK, SNAPSHOT_COUNT,
};
use crate::shaping::{separate_anytime_td, shape_anytime_td, shape_games, shape_props};
use crate::store::{SheetStore, WriteSummary};
use crate::utils::data::save_collection_package;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Games a snapshot covers: the whole week for the opening snapshot, only
/// today's games for a closing one.
pub fn select_games(
    window: &SnapshotWindow,
    raw_games: &[RawGame],
    now: DateTime<Utc>,
) -> Result<TodaysGames, CollectionError> {
    match window.kind {
        SnapshotKind::Opening => Ok(TodaysGames {
            games: raw_games.to_vec(),
            skipped: 0,
        }),
        SnapshotKind::Final => {
            let today = filter_today(raw_games, league_now(now));
            if today.games.is_empty() {
                return Err(CollectionError::NoGamesForWindow {
                    snapshot: window.number,
                    available: raw_games.iter().map(GameSummary::from).collect(),
                });
            }
            Ok(today)
        }
    }
}

/// Build the collection package for one snapshot from raw feed data.
///
/// Props are only shaped for closing snapshots; an opening package always
/// has empty prop tables.
pub fn assemble(
    week: u8,
    window: &SnapshotWindow,
    raw_games: &[RawGame],
    raw_props: &[RawPropOutcome],
    now: DateTime<Utc>,
) -> Result<CollectionResult, CollectionError> {
    let selected = select_games(window, raw_games, now)?;

    let games = shape_games(&selected.games, window.kind, now);
    let mut skipped = SkippedRecords {
        games: selected.skipped,
        ..Default::default()
    };
    skipped.absorb(games.skipped);

    let (props_data, anytime_td_props_data) = match window.kind {
        SnapshotKind::Opening => (Vec::new(), Vec::new()),
        SnapshotKind::Final => {
            let (regular, anytime_td) = separate_anytime_td(raw_props.to_vec());
            let props = shape_props(&regular, now);
            let anytime_td = shape_anytime_td(&anytime_td, now);
            skipped.props += props.skipped + anytime_td.skipped;
            (props.rows, anytime_td.rows)
        }
    };

    info!(
        "Week {} snapshot {}: {} game rows, {} prop rows, {} anytime TD rows",
        week,
        window.number,
        games.rows.len(),
        props_data.len(),
        anytime_td_props_data.len()
    );
    if skipped.total() > 0 {
        warn!(
            "Skipped {} games, {} bookmakers, {} prop outcomes",
            skipped.games, skipped.bookmakers, skipped.props
        );
    }

    Ok(CollectionResult {
        week,
        snapshot: window.number,
        snapshot_description: window.description().to_string(),
        collection_timestamp: now,
        games_data: games.rows,
        props_data,
        anytime_td_props_data,
        skipped_records: skipped,
    })
}

/// Fetch everything a snapshot needs from `source`, one request at a time,
/// and assemble it.
pub async fn collect_snapshot(
    source: &dyn OddsSource,
    week: u8,
    window: &SnapshotWindow,
    now: DateTime<Utc>,
) -> Result<CollectionResult, CollectionError> {
    info!(
        "Collecting week {} snapshot {} ({})",
        week,
        window.number,
        window.description()
    );

    let raw_games = source
        .list_games(week)
        .await
        .map_err(|e| CollectionError::source_unavailable(Stage::FetchGames, e))?;

    if raw_games.is_empty() {
        return Err(CollectionError::SourceUnavailable {
            stage: Stage::FetchGames,
            reason: format!("no games returned for week {}", week),
        });
    }

    let mut raw_props = Vec::new();
    if window.kind == SnapshotKind::Final {
        let selected = select_games(window, &raw_games, now)?;
        info!("Collecting player props for {} games", selected.games.len());

        for game in &selected.games {
            if game.id.is_empty() {
                warn!("{} @ {} has no event id; skipping props", game.away_team, game.home_team);
                continue;
            }

            let outcomes = source
                .list_player_props(&game.id)
                .await
                .map_err(|e| CollectionError::source_unavailable(Stage::FetchProps, e))?;
            info!(
                "{} prop outcomes for {} @ {}",
                outcomes.len(),
                game.away_team,
                game.home_team
            );
            raw_props.extend(outcomes);
        }
    }

    assemble(week, window, &raw_games, &raw_props, now)
}

/// What a weekly run ended up doing
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Collected(CollectedSummary),
    NotScheduled {
        next_window: &'static str,
    },
    AlreadyCollected {
        snapshot: u8,
        existing: Vec<u8>,
    },
    NoGamesToday {
        snapshot: u8,
        available: Vec<GameSummary>,
    },
    Failed {
        stage: Stage,
        reason: String,
    },
    OffSeason {
        date: NaiveDate,
    },
    InvalidRequest {
        reason: String,
    },
}

impl From<CollectionError> for RunOutcome {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::SourceUnavailable { stage, reason } => {
                RunOutcome::Failed { stage, reason }
            }
            CollectionError::NoGamesForWindow { snapshot, available } => {
                RunOutcome::NoGamesToday { snapshot, available }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectedSummary {
    pub snapshot: u8,
    pub snapshot_description: String,
    pub collection_timestamp: DateTime<Utc>,
    pub games: usize,
    pub props: usize,
    pub anytime_td_props: usize,
    pub skipped: SkippedRecords,
    pub written: WriteSummary,
    pub data_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Collected,
    NotScheduled,
    AlreadyCollected,
    NoGamesToday,
    Failed,
    OffSeason,
    InvalidRequest,
}

/// Serializable account of a run, printed by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub status: RunStatus,
    pub week: Option<u8>,
    pub snapshot: Option<u8>,
    pub snapshot_description: Option<String>,
    pub error: Option<String>,
    pub suggestion: Option<String>,
    pub games_collected: usize,
    pub props_collected: usize,
    pub anytime_td_props_collected: usize,
    pub rows_written: usize,
    pub skipped_records: SkippedRecords,
    pub api_requests_made: u64,
    pub collection_timestamp: Option<DateTime<Utc>>,
    pub data_file: Option<PathBuf>,
    pub existing_snapshots: Vec<u8>,
    pub available_games: Vec<GameSummary>,
}

impl RunReport {
    pub fn new(week: Option<u8>, outcome: RunOutcome, api_requests_made: u64) -> Self {
        let mut report = RunReport {
            success: false,
            status: RunStatus::Failed,
            week,
            snapshot: None,
            snapshot_description: None,
            error: None,
            suggestion: None,
            games_collected: 0,
            props_collected: 0,
            anytime_td_props_collected: 0,
            rows_written: 0,
            skipped_records: SkippedRecords::default(),
            api_requests_made,
            collection_timestamp: None,
            data_file: None,
            existing_snapshots: Vec::new(),
            available_games: Vec::new(),
        };

        match outcome {
            RunOutcome::Collected(summary) => {
                report.success = true;
                report.status = RunStatus::Collected;
                report.snapshot = Some(summary.snapshot);
                report.snapshot_description = Some(summary.snapshot_description);
                report.games_collected = summary.games;
                report.props_collected = summary.props;
                report.anytime_td_props_collected = summary.anytime_td_props;
                report.rows_written = summary.written.rows_written();
                report.skipped_records = summary.skipped;
                report.collection_timestamp = Some(summary.collection_timestamp);
                report.data_file = summary.data_file;
            }
            RunOutcome::NotScheduled { next_window } => {
                report.status = RunStatus::NotScheduled;
                report.error = Some("Not a scheduled collection time".to_string());
                report.suggestion = Some(format!("Next collection: {}", next_window));
            }
            RunOutcome::AlreadyCollected { snapshot, existing } => {
                report.status = RunStatus::AlreadyCollected;
                report.snapshot = Some(snapshot);
                report.error = Some(format!("Snapshot {} already exists", snapshot));
                report.suggestion = Some("No action needed".to_string());
                report.existing_snapshots = existing;
            }
            RunOutcome::NoGamesToday { snapshot, available } => {
                report.status = RunStatus::NoGamesToday;
                report.snapshot = Some(snapshot);
                report.error = Some(no_games_message(&snapshot, &available));
                report.suggestion = Some(
                    "Run again on a game day, or force a snapshot with --snapshot".to_string(),
                );
                report.available_games = available;
            }
            RunOutcome::Failed { stage, reason } => {
                report.error = Some(format!("odds source unavailable while {}: {}", stage, reason));
                report.suggestion = Some("Retry later; nothing was written".to_string());
            }
            RunOutcome::OffSeason { date } => {
                report.status = RunStatus::OffSeason;
                report.error = Some(format!("{} is outside the NFL season calendar", date));
                report.suggestion = Some("Pass --week to collect a specific week".to_string());
            }
            RunOutcome::InvalidRequest { reason } => {
                report.status = RunStatus::InvalidRequest;
                report.error = Some(reason);
                report.suggestion = Some(format!(
                    "Weeks run 1 to {} and snapshots 1 to {}",
                    LAST_WEEK, SNAPSHOT_COUNT
                ));
            }
        }

        if let Some(snapshot) = report.snapshot {
            report
                .snapshot_description
                .get_or_insert_with(|| crate::schedule::snapshot_description(snapshot).to_string());
        }

        report
    }

    /// Nothing went wrong, even if nothing was collected
    pub fn is_no_op(&self) -> bool {
        matches!(
            self.status,
            RunStatus::NotScheduled | RunStatus::AlreadyCollected | RunStatus::OffSeason
        )
    }
}

/// Explicit week/snapshot overrides for a run; unset values come from the clock
#[derive(Debug, Clone, Copy)]
pub struct RunRequest {
    pub now: DateTime<Utc>,
    pub week: Option<u8>,
    pub snapshot: Option<u8>,
}

impl RunRequest {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            week: None,
            snapshot: None,
        }
    }
}

/// One scheduled collection: decide the snapshot, guard against repeats,
/// collect, archive and write to the store.
pub struct WeeklyWorkflow<'a> {
    source: &'a dyn OddsSource,
    store: &'a dyn SheetStore,
    calendar: SeasonCalendar,
    archive_dir: Option<PathBuf>,
}

impl<'a> WeeklyWorkflow<'a> {
    pub fn new(
        source: &'a dyn OddsSource,
        store: &'a dyn SheetStore,
        calendar: SeasonCalendar,
    ) -> Self {
        Self {
            source,
            store,
            calendar,
            archive_dir: None,
        }
    }

    /// Also save each collected package as JSON under `dir`
    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = Some(dir.into());
        self
    }

    /// Expected conditions end up in the report; only store and archive
    /// failures are returned as errors.
    pub async fn run(&self, request: RunRequest) -> Result<RunReport> {
        let local = league_now(request.now);
        let week = request.week.or_else(|| self.calendar.week_of(local.date()));
        let outcome = match week {
            Some(week) => self.run_week(week, request).await?,
            None => RunOutcome::OffSeason { date: local.date() },
        };

        Ok(RunReport::new(week, outcome, self.source.requests_made()))
    }

    async fn run_week(&self, week: u8, request: RunRequest) -> Result<RunOutcome> {
        let local = league_now(request.now);

        if !(1..=LAST_WEEK).contains(&week) {
            return Ok(RunOutcome::InvalidRequest {
                reason: format!("week must be between 1 and {}, got {}", LAST_WEEK, week),
            });
        }

        let window = match request.snapshot {
            Some(number) => match SnapshotWindow::forced(number) {
                Some(window) => window,
                None => {
                    return Ok(RunOutcome::InvalidRequest {
                        reason: format!(
                            "snapshot must be between 1 and {}, got {}",
                            SNAPSHOT_COUNT, number
                        ),
                    });
                }
            },
            None => match resolve(local) {
                Some(window) => window,
                None => {
                    info!("Not a scheduled collection time ({})", local.format("%A %H:%M"));
                    return Ok(RunOutcome::NotScheduled {
                        next_window: next_window_description(local),
                    });
                }
            },
        };
        info!("Target snapshot: {} - {}", window.number, window.description());

        let existing = self.store.collected_snapshots(week).await?;
        if existing.contains(&window.number) {
            info!("Snapshot {} already collected for week {}", window.number, week);
            return Ok(RunOutcome::AlreadyCollected {
                snapshot: window.number,
                existing,
            });
        }

        let result = match collect_snapshot(self.source, week, &window, request.now).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Collection did not complete: {}", e);
                return Ok(e.into());
            }
        };

        let data_file = match &self.archive_dir {
            Some(dir) => {
                let path = save_collection_package(&result, dir)?;
                info!("Saved collection package to {}", path.display());
                Some(path)
            }
            None => None,
        };

        let written = self.store.persist(&result).await?;

        Ok(RunOutcome::Collected(CollectedSummary {
            snapshot: result.snapshot,
            snapshot_description: result.snapshot_description,
            collection_timestamp: result.collection_timestamp,
            games: result.games_data.len(),
            props: result.props_data.len(),
            anytime_td_props: result.anytime_td_props_data.len(),
            skipped: result.skipped_records,
            written,
            data_file,
        }))
    }
}
