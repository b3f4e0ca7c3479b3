use crate::error::MalformedRecord;
use crate::models::{
    GameRow, OddsSnapshot, RawBookmaker, RawGame, RawMarket, SkippedRecords, SnapshotKind,
};
use crate::schedule::{parse_commence_time, season_year};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Four-letter uppercase code from a team name, e.g. "Kansas City Chiefs" -> "KANS"
pub fn team_code(team: &str) -> String {
    team.chars()
        .filter(|c| !c.is_whitespace())
        .take(4)
        .collect::<String>()
        .to_uppercase()
}

/// Deterministic game identity: league, season, UTC kickoff date and both team codes.
///
/// `NFL_2025_2025-09-07_BALT_KANS` for Baltimore at Kansas City.
pub fn game_id(commence_time: &DateTime<Utc>, home_team: &str, away_team: &str) -> String {
    let date = commence_time.date_naive();
    format!(
        "NFL_{}_{}_{}_{}",
        season_year(date),
        date.format("%Y-%m-%d"),
        team_code(away_team),
        team_code(home_team)
    )
}

/// Resolve the identity of a raw game record, or explain why it has none
pub fn identify(
    commence_time: Option<&str>,
    home_team: &str,
    away_team: &str,
) -> Result<(String, DateTime<Utc>), MalformedRecord> {
    if home_team.trim().is_empty() || away_team.trim().is_empty() {
        return Err(MalformedRecord::MissingTeams);
    }
    let kickoff = parse_commence_time(commence_time)?;
    Ok((game_id(&kickoff, home_team, away_team), kickoff))
}

/// American odds are whole numbers; the API still sends them as JSON numbers
pub(crate) fn american(price: Option<f64>) -> Option<i32> {
    price.map(|p| p.round() as i32)
}

#[derive(Debug, Clone, Default)]
pub struct ShapedGames {
    pub rows: Vec<GameRow>,
    pub skipped: SkippedRecords,
}

/// Flatten raw games into one row per (game, bookmaker), filling the
/// snapshot slot for `kind`.
pub fn shape_games(
    raw_games: &[RawGame],
    kind: SnapshotKind,
    collected_at: DateTime<Utc>,
) -> ShapedGames {
    let mut shaped = ShapedGames::default();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut matchups: HashMap<String, (&str, &str)> = HashMap::new();

    for game in raw_games {
        let (game_id, kickoff) =
            match identify(game.commence_time.as_deref(), &game.home_team, &game.away_team) {
                Ok(identity) => identity,
                Err(e) => {
                    warn!("Skipping game {:?}: {}", game.id, e);
                    shaped.skipped.games += 1;
                    continue;
                }
            };

        let matchup = (game.away_team.as_str(), game.home_team.as_str());
        let owner = *matchups.entry(game_id.clone()).or_insert(matchup);
        if owner != matchup {
            warn!(
                "Skipping {} @ {}: {} already belongs to {} @ {}",
                game.away_team, game.home_team, game_id, owner.0, owner.1
            );
            shaped.skipped.games += 1;
            continue;
        }

        let bookmakers = match game.bookmakers.as_deref() {
            Some(bookmakers) if !bookmakers.is_empty() => bookmakers,
            _ => {
                warn!("Skipping {} @ {}: no bookmaker data", game.away_team, game.home_team);
                shaped.skipped.games += 1;
                continue;
            }
        };

        for bookmaker in bookmakers {
            let markets = match bookmaker.markets.as_deref() {
                Some(markets) if !markets.is_empty() => markets,
                _ => {
                    debug!("{} has no markets for {}", bookmaker_name(bookmaker), game_id);
                    shaped.skipped.bookmakers += 1;
                    continue;
                }
            };

            let snapshot = shape_markets(markets, game, kind, collected_at);
            let key = (game_id.clone(), bookmaker_name(bookmaker));

            match index.get(&key) {
                // Same bookmaker listed twice: the later quote wins
                Some(&i) => *shaped.rows[i].snapshot_mut(kind) = Some(snapshot),
                None => {
                    let mut row = GameRow {
                        game_id: key.0.clone(),
                        date: kickoff,
                        home_team: game.home_team.clone(),
                        away_team: game.away_team.clone(),
                        bookmaker: key.1.clone(),
                        opening: None,
                        closing: None,
                    };
                    *row.snapshot_mut(kind) = Some(snapshot);
                    index.insert(key, shaped.rows.len());
                    shaped.rows.push(row);
                }
            }
        }
    }

    shaped
}

fn bookmaker_name(bookmaker: &RawBookmaker) -> String {
    if bookmaker.title.is_empty() {
        bookmaker.key.clone()
    } else {
        bookmaker.title.clone()
    }
}

fn shape_markets(
    markets: &[RawMarket],
    game: &RawGame,
    kind: SnapshotKind,
    collected_at: DateTime<Utc>,
) -> OddsSnapshot {
    let mut snapshot = OddsSnapshot::empty(kind, collected_at);

    for market in markets {
        match market.key.as_str() {
            "spreads" => {
                for outcome in &market.outcomes {
                    if outcome.name == game.home_team {
                        snapshot.spread_line = outcome.point;
                        snapshot.spread_home_odds = american(outcome.price);
                    } else if outcome.name == game.away_team {
                        snapshot.spread_away_odds = american(outcome.price);
                    }
                }
            }
            "totals" => {
                for outcome in &market.outcomes {
                    if outcome.name.contains("Over") {
                        snapshot.total_line = outcome.point;
                        snapshot.total_over_odds = american(outcome.price);
                    } else if outcome.name.contains("Under") {
                        snapshot.total_under_odds = american(outcome.price);
                    }
                }
            }
            "h2h" => {
                for outcome in &market.outcomes {
                    if outcome.name == game.home_team {
                        snapshot.ml_home_odds = american(outcome.price);
                    } else if outcome.name == game.away_team {
                        snapshot.ml_away_odds = american(outcome.price);
                    }
                }
            }
            _ => {}
        }
    }

    snapshot
}
