use serde::{Deserialize, Serialize};

/// A game as returned by The Odds API `/sports/{sport}/odds` endpoint.
///
/// Every field is defaulted so that one incomplete record never fails the
/// whole payload; incomplete records are skipped later during shaping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawGame {
    pub id: String,
    pub sport_title: String,
    pub commence_time: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub bookmakers: Option<Vec<RawBookmaker>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBookmaker {
    pub key: String,
    pub title: String,
    pub markets: Option<Vec<RawMarket>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMarket {
    pub key: String,
    pub outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOutcome {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Option<f64>,
    pub point: Option<f64>,
}

/// Event odds payload from `/sports/{sport}/events/{id}/odds`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEventOdds {
    pub id: String,
    pub commence_time: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub bookmakers: Vec<RawBookmaker>,
}

/// One prop outcome flattened out of the event → bookmaker → market nesting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPropOutcome {
    pub event_id: String,
    pub commence_time: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub bookmaker: String,
    /// API market key, e.g. `player_pass_yds`
    pub market_key: String,
    pub name: String,
    pub description: Option<String>,
    pub point: Option<f64>,
    pub price: Option<f64>,
}

impl RawEventOdds {
    /// Flatten every outcome of `market_key` across all bookmakers.
    pub fn prop_outcomes(&self, market_key: &str) -> Vec<RawPropOutcome> {
        let mut outcomes = Vec::new();

        for bookmaker in &self.bookmakers {
            let markets = match &bookmaker.markets {
                Some(markets) => markets,
                None => continue,
            };

            for market in markets.iter().filter(|m| m.key == market_key) {
                for outcome in &market.outcomes {
                    outcomes.push(RawPropOutcome {
                        event_id: self.id.clone(),
                        commence_time: self.commence_time.clone(),
                        home_team: self.home_team.clone(),
                        away_team: self.away_team.clone(),
                        bookmaker: bookmaker.title.clone(),
                        market_key: market.key.clone(),
                        name: outcome.name.clone(),
                        description: outcome.description.clone(),
                        point: outcome.point,
                        price: outcome.price,
                    });
                }
            }
        }

        outcomes
    }
}
