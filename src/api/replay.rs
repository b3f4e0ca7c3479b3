use super::{games_cache_file, props_cache_file, OddsSource};
use crate::models::{RawGame, RawPropOutcome};
use crate::utils::data::load_from_cache;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Replays raw payloads previously cached by [`super::OddsApiClient`],
/// so a past week can be shaped again without touching the network.
pub struct ReplaySource {
    dir: PathBuf,
    reads: AtomicU64,
}

impl ReplaySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            reads: AtomicU64::new(0),
        }
    }

    /// Cache files read so far
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl OddsSource for ReplaySource {
    async fn list_games(&self, week: u8) -> Result<Vec<RawGame>> {
        let path = self.dir.join(games_cache_file(week));
        let games: Vec<RawGame> = load_from_cache(&path)
            .with_context(|| format!("No replayable games for week {}", week))?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        info!("Replaying {} games from {}", games.len(), path.display());
        Ok(games)
    }

    async fn list_player_props(&self, event_id: &str) -> Result<Vec<RawPropOutcome>> {
        let path = self.dir.join(props_cache_file(event_id));
        if !path.exists() {
            debug!("No cached props for {}", event_id);
            return Ok(Vec::new());
        }

        let outcomes = load_from_cache(&path)?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(outcomes)
    }

    /// Replays never hit the API
    fn requests_made(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::data::save_to_cache;

    #[tokio::test]
    async fn test_replays_cached_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let games = vec![RawGame {
            id: "evt1".to_string(),
            home_team: "Kansas City Chiefs".to_string(),
            away_team: "Baltimore Ravens".to_string(),
            commence_time: Some("2025-09-07T17:00:00Z".to_string()),
            ..Default::default()
        }];
        let props = vec![RawPropOutcome {
            event_id: "evt1".to_string(),
            market_key: "player_pass_yds".to_string(),
            name: "Over".to_string(),
            description: Some("Patrick Mahomes".to_string()),
            ..Default::default()
        }];
        save_to_cache(&games, dir.path().join("games_week_1.json")).unwrap();
        save_to_cache(&props, dir.path().join("props_evt1.json")).unwrap();

        let source = ReplaySource::new(dir.path());
        let replayed = source.list_games(1).await.unwrap();
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].home_team, "Kansas City Chiefs");

        let replayed_props = source.list_player_props("evt1").await.unwrap();
        assert_eq!(replayed_props.len(), 1);
        assert_eq!(replayed_props[0].description.as_deref(), Some("Patrick Mahomes"));

        assert_eq!(source.reads(), 2);
        assert_eq!(source.requests_made(), 0);
    }

    #[tokio::test]
    async fn test_missing_games_is_an_error_missing_props_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = ReplaySource::new(dir.path());

        assert!(source.list_games(3).await.is_err());
        assert!(source.list_player_props("evt9").await.unwrap().is_empty());
    }
}
