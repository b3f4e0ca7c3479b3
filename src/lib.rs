pub mod api;
pub mod collector;
pub mod config;
pub mod error;
pub mod models;
pub mod schedule;
pub mod shaping;
pub mod store;
pub mod utils;

pub use api::{OddsApiClient, OddsSource, RateBudget, ReplaySource};
pub use collector::{
    assemble, collect_snapshot, RunOutcome, RunReport, RunRequest, RunStatus, WeeklyWorkflow,
};
pub use config::Config;
pub use error::{CollectionError, MalformedRecord, Stage};
pub use models::*;
pub use schedule::{SeasonCalendar, SnapshotWindow, LEAGUE_TZ};
pub use store::{SheetStore, WorkbookStore, WriteSummary};
