pub mod workbook;

pub use workbook::{Overview, SnapshotStatus, WorkbookStore};

use crate::models::CollectionResult;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Rows written by one persist call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub games_inserted: usize,
    pub games_updated: usize,
    pub props_inserted: usize,
    pub props_updated: usize,
    pub anytime_td_inserted: usize,
    pub anytime_td_updated: usize,
}

impl WriteSummary {
    pub fn rows_written(&self) -> usize {
        self.games_inserted
            + self.games_updated
            + self.props_inserted
            + self.props_updated
            + self.anytime_td_inserted
            + self.anytime_td_updated
    }
}

/// Destination for collected snapshots.
///
/// `persist` must upsert by row identity: persisting the same result twice
/// leaves the same rows behind as persisting it once.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Snapshot numbers already recorded for `week`
    async fn collected_snapshots(&self, week: u8) -> Result<Vec<u8>>;

    async fn persist(&self, result: &CollectionResult) -> Result<WriteSummary>;
}
