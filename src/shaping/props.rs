use super::odds::{american, identify};
use crate::error::MalformedRecord;
use crate::models::{
    AnytimeTdRow, PlayerPropRow, PlayerTeam, PositionHint, PropMarket, RawPropOutcome,
    DATA_SOURCE,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Over,
    Under,
}

impl Side {
    /// "Yes"/"No" are accepted for single-sided markets such as anytime TD
    pub fn from_outcome_name(name: &str) -> Option<Side> {
        if name.contains("Over") || name == "Yes" {
            Some(Side::Over)
        } else if name.contains("Under") || name == "No" {
            Some(Side::Under)
        } else {
            None
        }
    }
}

/// Player name from a prop outcome: the `description` field when the API
/// provides one, otherwise the `name` field minus its trailing Over/Under token.
pub fn player_name(outcome: &RawPropOutcome) -> Option<String> {
    if let Some(description) = &outcome.description {
        let name = description.replace(" Over", "").replace(" Under", "");
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    let tokens: Vec<&str> = outcome.name.split_whitespace().collect();
    if tokens.len() >= 2 {
        Some(tokens[..tokens.len() - 1].join(" "))
    } else {
        None
    }
}

pub fn is_anytime_td(outcome: &RawPropOutcome) -> bool {
    PropMarket::from_key(&outcome.market_key).is_anytime_td()
}

/// Split raw outcomes into (regular over/under props, anytime TD props)
pub fn separate_anytime_td(
    outcomes: Vec<RawPropOutcome>,
) -> (Vec<RawPropOutcome>, Vec<RawPropOutcome>) {
    outcomes.into_iter().partition(|o| !is_anytime_td(o))
}

/// A raw outcome that carries everything needed to key a row
struct PropQuote {
    game_id: String,
    player_name: String,
    market: PropMarket,
    bookmaker: String,
    side: Side,
    point: Option<f64>,
    price: Option<i32>,
}

fn read_quote(outcome: &RawPropOutcome) -> Result<PropQuote, MalformedRecord> {
    let (game_id, _) = identify(
        outcome.commence_time.as_deref(),
        &outcome.home_team,
        &outcome.away_team,
    )?;

    let player_name = player_name(outcome)
        .ok_or_else(|| MalformedRecord::MissingPlayerName(outcome.name.clone()))?;

    let side = Side::from_outcome_name(&outcome.name)
        .ok_or_else(|| MalformedRecord::UnknownSide(outcome.name.clone()))?;

    Ok(PropQuote {
        game_id,
        player_name,
        market: PropMarket::from_key(&outcome.market_key),
        bookmaker: outcome.bookmaker.clone(),
        side,
        point: outcome.point,
        price: american(outcome.price),
    })
}

#[derive(Debug, Clone)]
pub struct ShapedProps<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for ShapedProps<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            skipped: 0,
        }
    }
}

/// Group over/under outcomes into one row per (game, player, market, bookmaker).
/// Expects the regular half of [`separate_anytime_td`].
pub fn shape_props(
    outcomes: &[RawPropOutcome],
    collected_at: DateTime<Utc>,
) -> ShapedProps<PlayerPropRow> {
    let mut shaped: ShapedProps<PlayerPropRow> = ShapedProps::default();
    let mut index: HashMap<(String, String, String, String), usize> = HashMap::new();

    for outcome in outcomes {
        let quote = match read_quote(outcome) {
            Ok(quote) => quote,
            Err(e) => {
                debug!("Skipping prop outcome from {}: {}", outcome.bookmaker, e);
                shaped.skipped += 1;
                continue;
            }
        };

        let key = (
            quote.game_id.clone(),
            quote.player_name.clone(),
            quote.market.key().to_string(),
            quote.bookmaker.clone(),
        );

        let i = *index.entry(key).or_insert_with(|| {
            shaped.rows.push(PlayerPropRow {
                game_id: quote.game_id.clone(),
                player_name: quote.player_name.clone(),
                position_hint: PositionHint::from_market(&quote.market),
                team: PlayerTeam::Unresolved,
                market_type: quote.market.clone(),
                bookmaker: quote.bookmaker.clone(),
                data_source: DATA_SOURCE.to_string(),
                over_line: None,
                over_odds: None,
                under_line: None,
                under_odds: None,
                collected_at,
                season_over_rate: None,
                season_attempts: None,
                vs_defense_rate: None,
                recent_form_3g: None,
                home_away_split: None,
            });
            shaped.rows.len() - 1
        });

        let row = &mut shaped.rows[i];
        match quote.side {
            Side::Over => {
                row.over_line = quote.point;
                row.over_odds = quote.price;
            }
            Side::Under => {
                row.under_line = quote.point;
                row.under_odds = quote.price;
            }
        }
    }

    if shaped.skipped > 0 {
        warn!("Skipped {} unreadable prop outcomes", shaped.skipped);
    }

    shaped
}

/// One row per (game, player, bookmaker) carrying the "yes" price.
/// "No" prices are not tracked for this market.
pub fn shape_anytime_td(
    outcomes: &[RawPropOutcome],
    collected_at: DateTime<Utc>,
) -> ShapedProps<AnytimeTdRow> {
    let mut shaped: ShapedProps<AnytimeTdRow> = ShapedProps::default();
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();

    for outcome in outcomes {
        let quote = match read_quote(outcome) {
            Ok(quote) => quote,
            Err(e) => {
                debug!("Skipping anytime TD outcome from {}: {}", outcome.bookmaker, e);
                shaped.skipped += 1;
                continue;
            }
        };

        if quote.side == Side::Under {
            continue;
        }

        let key = (
            quote.game_id.clone(),
            quote.player_name.clone(),
            quote.bookmaker.clone(),
        );

        match index.get(&key) {
            Some(&i) => shaped.rows[i].odds = quote.price,
            None => {
                index.insert(key, shaped.rows.len());
                shaped.rows.push(AnytimeTdRow {
                    game_id: quote.game_id,
                    player_name: quote.player_name,
                    team: PlayerTeam::Unresolved,
                    bookmaker: quote.bookmaker,
                    data_source: DATA_SOURCE.to_string(),
                    odds: quote.price,
                    collected_at,
                    season_tds: None,
                    red_zone_targets: None,
                    goal_line_carries: None,
                    recent_td_rate: None,
                });
            }
        }
    }

    if shaped.skipped > 0 {
        warn!("Skipped {} unreadable anytime TD outcomes", shaped.skipped);
    }

    shaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn prop(
        market: &str,
        name: &str,
        description: Option<&str>,
        point: Option<f64>,
        price: f64,
    ) -> RawPropOutcome {
        RawPropOutcome {
            event_id: "evt1".to_string(),
            commence_time: Some("2025-09-07T17:00:00Z".to_string()),
            home_team: "Kansas City Chiefs".to_string(),
            away_team: "Baltimore Ravens".to_string(),
            bookmaker: "DraftKings".to_string(),
            market_key: market.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            point,
            price: Some(price),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 7, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_player_name_extraction() {
        let described =
            prop("player_pass_yds", "Over", Some("Patrick Mahomes"), Some(250.5), -110.0);
        assert_eq!(player_name(&described).as_deref(), Some("Patrick Mahomes"));

        let suffixed = prop("player_pass_yds", "Over", Some("Lamar Jackson Under"), None, -110.0);
        assert_eq!(player_name(&suffixed).as_deref(), Some("Lamar Jackson"));

        let folded = prop("player_pass_yds", "Derrick Henry Over", None, Some(89.5), -110.0);
        assert_eq!(player_name(&folded).as_deref(), Some("Derrick Henry"));

        let blank_description =
            prop("player_rush_yds", "Isiah Pacheco Under", Some("  "), None, -110.0);
        assert_eq!(player_name(&blank_description).as_deref(), Some("Isiah Pacheco"));

        let nameless = prop("player_pass_yds", "Over", None, Some(250.5), -110.0);
        assert_eq!(player_name(&nameless), None);
    }

    #[test]
    fn test_over_and_under_merge_in_any_order() {
        let over = prop("player_pass_yds", "Over", Some("Patrick Mahomes"), Some(250.5), -115.0);
        let under = prop("player_pass_yds", "Under", Some("Patrick Mahomes"), Some(250.5), -105.0);

        let forward = shape_props(&[over.clone(), under.clone()], now());
        let backward = shape_props(&[under, over], now());

        assert_eq!(forward.rows.len(), 1);
        assert_eq!(forward.rows, backward.rows);

        let row = &forward.rows[0];
        assert_eq!(row.over_line, Some(250.5));
        assert_eq!(row.over_odds, Some(-115));
        assert_eq!(row.under_line, Some(250.5));
        assert_eq!(row.under_odds, Some(-105));
        assert_eq!(row.position_hint, PositionHint::Quarterback);
        assert_eq!(row.team, PlayerTeam::Unresolved);
        assert_eq!(row.market_type, PropMarket::PassYards);
        assert_eq!(row.game_id, "NFL_2025_2025-09-07_BALT_KANS");
        assert_eq!(row.data_source, "odds_api");
    }

    #[test]
    fn test_duplicate_outcomes_do_not_duplicate_rows() {
        let over = prop("player_rush_yds", "Over", Some("Derrick Henry"), Some(89.5), -110.0);
        let shaped = shape_props(&[over.clone(), over.clone(), over], now());
        assert_eq!(shaped.rows.len(), 1);
        assert_eq!(shaped.rows[0].under_odds, None);
    }

    #[test]
    fn test_distinct_keys_produce_distinct_rows() {
        let mut other_book =
            prop("player_pass_yds", "Over", Some("Patrick Mahomes"), Some(251.5), -110.0);
        other_book.bookmaker = "FanDuel".to_string();

        let outcomes = vec![
            prop("player_pass_yds", "Over", Some("Patrick Mahomes"), Some(250.5), -115.0),
            prop("player_pass_tds", "Over", Some("Patrick Mahomes"), Some(1.5), -140.0),
            prop("player_pass_yds", "Over", Some("Lamar Jackson"), Some(220.5), -110.0),
            other_book,
        ];

        assert_eq!(shape_props(&outcomes, now()).rows.len(), 4);
    }

    #[test]
    fn test_unkeyable_outcomes_are_counted() {
        let outcomes = vec![
            prop("player_pass_yds", "Over", None, Some(250.5), -110.0),
            prop("player_pass_yds", "Push", Some("Patrick Mahomes"), Some(250.5), -110.0),
            prop("player_pass_yds", "Over", Some("Patrick Mahomes"), Some(250.5), -110.0),
        ];

        let shaped = shape_props(&outcomes, now());
        assert_eq!(shaped.rows.len(), 1);
        assert_eq!(shaped.skipped, 2);
    }

    #[test]
    fn test_anytime_td_isolated_from_regular_props() {
        let outcomes = vec![
            prop("player_anytime_td", "Over", Some("Travis Kelce"), None, 120.0),
            prop("player_anytime_td", "Under", Some("Travis Kelce"), None, -160.0),
            prop("player_reception_yds", "Over", Some("Travis Kelce"), Some(60.5), -110.0),
        ];

        let (regular, td) = separate_anytime_td(outcomes);
        assert_eq!(regular.len(), 1);
        assert_eq!(td.len(), 2);

        let regular = shape_props(&regular, now());
        assert_eq!(regular.rows.len(), 1);
        assert_eq!(regular.rows[0].market_type, PropMarket::ReceptionYards);
        assert_eq!(regular.rows[0].position_hint, PositionHint::Receiver);

        let td = shape_anytime_td(&td, now());
        assert_eq!(td.rows.len(), 1);
        assert_eq!(td.rows[0].player_name, "Travis Kelce");
        assert_eq!(td.rows[0].odds, Some(120));
    }

    #[test]
    fn test_anytime_td_yes_no_names() {
        let outcomes = vec![
            prop("player_anytime_td", "No", Some("Isiah Pacheco"), None, -200.0),
            prop("player_anytime_td", "Yes", Some("Isiah Pacheco"), None, 150.0),
        ];

        let td = shape_anytime_td(&outcomes, now());
        assert_eq!(td.rows.len(), 1);
        assert_eq!(td.rows[0].odds, Some(150));
    }

    #[test]
    fn test_anytime_td_without_yes_price_emits_nothing() {
        let outcomes = vec![prop(
            "player_anytime_td",
            "Under",
            Some("Travis Kelce"),
            None,
            -160.0,
        )];
        assert!(shape_anytime_td(&outcomes, now()).rows.is_empty());
    }

    #[test]
    fn test_separate_anytime_td() {
        let outcomes = vec![
            prop("player_anytime_td", "Over", Some("Travis Kelce"), None, 120.0),
            prop("player_pass_yds", "Over", Some("Patrick Mahomes"), Some(250.5), -110.0),
        ];

        let (regular, td) = separate_anytime_td(outcomes);
        assert_eq!(regular.len(), 1);
        assert_eq!(td.len(), 1);
        assert_eq!(td[0].market_key, "player_anytime_td");
    }

    #[test]
    fn test_anytime_td_repeated_quote_keeps_latest_price() {
        let outcomes = vec![
            prop("player_anytime_td", "Yes", Some("Travis Kelce"), None, 120.0),
            prop("player_anytime_td", "Yes", Some("Travis Kelce"), None, 130.0),
        ];

        let td = shape_anytime_td(&outcomes, now());
        assert_eq!(td.rows.len(), 1);
        assert_eq!(td.rows[0].odds, Some(130));
    }
}
