use crate::models::GameSummary;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a single raw record was dropped. Never fatal for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
    #[error("missing commence_time")]
    MissingCommenceTime,
    #[error("unparsable commence_time {0:?}")]
    CommenceTime(String),
    #[error("missing team names")]
    MissingTeams,
    #[error("no player name in outcome {0:?}")]
    MissingPlayerName(String),
    #[error("outcome {0:?} is neither Over nor Under")]
    UnknownSide(String),
}

/// Step of a collection run that talks to the odds source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    FetchGames,
    FetchProps,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::FetchGames => write!(f, "fetching games"),
            Stage::FetchProps => write!(f, "fetching player props"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("odds source unavailable while {stage}: {reason}")]
    SourceUnavailable { stage: Stage, reason: String },

    #[error("{}", no_games_message(.snapshot, .available))]
    NoGamesForWindow {
        snapshot: u8,
        available: Vec<GameSummary>,
    },
}

pub fn no_games_message(snapshot: &u8, available: &[GameSummary]) -> String {
    format!(
        "no games scheduled for today - cannot collect final lines for snapshot {} \
         ({} games this week)",
        snapshot,
        available.len()
    )
}

impl CollectionError {
    pub fn source_unavailable(stage: Stage, err: anyhow::Error) -> Self {
        CollectionError::SourceUnavailable {
            stage,
            reason: format!("{:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_games_message() {
        let err = CollectionError::NoGamesForWindow {
            snapshot: 4,
            available: vec![GameSummary {
                away_team: "Dallas Cowboys".to_string(),
                home_team: "Philadelphia Eagles".to_string(),
                commence_time: Some("2025-09-05T00:20:00Z".to_string()),
            }],
        };
        let message = err.to_string().to_lowercase();
        assert!(message.contains("no games scheduled for today"));
        assert!(message.contains("1 games this week"));
    }

    #[test]
    fn test_source_unavailable_keeps_context_chain() {
        let inner = anyhow::anyhow!("connection refused").context("Failed to fetch odds");
        let err = CollectionError::source_unavailable(Stage::FetchGames, inner);
        let message = err.to_string();
        assert!(message.contains("fetching games"));
        assert!(message.contains("Failed to fetch odds: connection refused"));
    }
}
