pub mod odds_api;
pub mod rate_budget;
pub mod replay;

pub use odds_api::{ApiUsage, OddsApiClient};
pub use rate_budget::RateBudget;
pub use replay::ReplaySource;

use crate::models::{RawGame, RawPropOutcome};
use anyhow::Result;
use async_trait::async_trait;

/// Where raw odds come from. Implementations own their own pacing and
/// request accounting; callers simply await each call in turn.
#[async_trait]
pub trait OddsSource: Send + Sync {
    /// Every game of `week` with game-line markets for all bookmakers
    async fn list_games(&self, week: u8) -> Result<Vec<RawGame>>;

    /// All configured player prop outcomes for one game, across bookmakers
    async fn list_player_props(&self, event_id: &str) -> Result<Vec<RawPropOutcome>>;

    /// Requests made so far, for reporting
    fn requests_made(&self) -> u64;
}

/// Cache file holding the raw game list of a week
pub fn games_cache_file(week: u8) -> String {
    format!("games_week_{}.json", week)
}

/// Cache file holding the flattened prop outcomes of one game
pub fn props_cache_file(event_id: &str) -> String {
    format!("props_{}.json", event_id)
}
