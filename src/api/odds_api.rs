use super::{games_cache_file, props_cache_file, OddsSource, RateBudget};
use crate::config::Config;
use crate::models::{RawEventOdds, RawGame, RawPropOutcome};
use crate::schedule::SeasonCalendar;
use crate::utils::data::save_to_cache;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Account usage as reported by The Odds API response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiUsage {
    pub remaining: Option<u64>,
    pub used: Option<u64>,
}

pub struct OddsApiClient {
    api_key: String,
    base_url: String,
    sport: String,
    regions: String,
    game_markets: String,
    prop_markets: Vec<String>,
    prop_request_delay: Duration,
    game_delay: Duration,
    calendar: SeasonCalendar,
    raw_data_dir: Option<PathBuf>,
    budget: RateBudget,
    prop_games_fetched: AtomicU64,
    client: reqwest::Client,
}

impl OddsApiClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key: config.api_key()?.to_string(),
            base_url: config.base_url.clone(),
            sport: config.sport.clone(),
            regions: config.regions.clone(),
            game_markets: config.game_markets.clone(),
            prop_markets: config.prop_markets.clone(),
            prop_request_delay: config.prop_request_delay,
            game_delay: config.game_delay,
            calendar: config.calendar(),
            raw_data_dir: config.raw_data_dir.clone(),
            budget: RateBudget::per_minute(config.requests_per_minute),
            prop_games_fetched: AtomicU64::new(0),
            client,
        })
    }

    fn games_query(&self, week: u8) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("apiKey", self.api_key.clone()),
            ("regions", self.regions.clone()),
            ("markets", self.game_markets.clone()),
            ("oddsFormat", "american".to_string()),
            ("dateFormat", "iso".to_string()),
        ];

        match self.calendar.week_bounds(week) {
            Some((from, to)) => {
                query.push(("commenceTimeFrom", from.to_rfc3339_opts(SecondsFormat::Secs, true)));
                query.push(("commenceTimeTo", to.to_rfc3339_opts(SecondsFormat::Secs, true)));
            }
            None => warn!(
                "Week {} is outside the season calendar; fetching all upcoming games",
                week
            ),
        }

        query
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.budget.acquire().await;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to reach The Odds API at {}", url))?;

        self.budget.record(response.headers());

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Odds API returned error {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse Odds API response")
    }

    fn cache_raw<T: Serialize + ?Sized>(&self, data: &T, file: String) {
        if let Some(dir) = &self.raw_data_dir {
            if let Err(e) = save_to_cache(data, dir.join(&file)) {
                warn!("Could not cache raw payload {}: {:#}", file, e);
            }
        }
    }

    /// Fetch every game of `week` with spreads, totals and moneylines
    pub async fn fetch_games(&self, week: u8) -> Result<Vec<RawGame>> {
        let url = format!("{}/sports/{}/odds", self.base_url, self.sport);
        let games: Vec<RawGame> = self
            .get_json(&url, &self.games_query(week))
            .await
            .context("Failed to fetch NFL game odds")?;

        info!("Fetched {} games for week {}", games.len(), week);
        self.cache_raw(&games, games_cache_file(week));
        Ok(games)
    }

    /// Fetch a single prop market for one event
    pub async fn fetch_event_odds(&self, event_id: &str, market: &str) -> Result<RawEventOdds> {
        let url = format!("{}/sports/{}/events/{}/odds", self.base_url, self.sport, event_id);
        let query = [
            ("apiKey", self.api_key.clone()),
            ("regions", self.regions.clone()),
            ("markets", market.to_string()),
            ("oddsFormat", "american".to_string()),
            ("dateFormat", "iso".to_string()),
        ];

        self.get_json(&url, &query)
            .await
            .with_context(|| format!("Failed to fetch {} for event {}", market, event_id))
    }

    /// Fetch all configured prop markets for one event, one request per
    /// market. A failing market is skipped; the call only fails when every
    /// market does.
    pub async fn fetch_player_props(&self, event_id: &str) -> Result<Vec<RawPropOutcome>> {
        if self.prop_games_fetched.fetch_add(1, Ordering::Relaxed) > 0 {
            tokio::time::sleep(self.game_delay).await;
        }

        let mut outcomes = Vec::new();
        let mut last_error = None;
        let mut markets_ok = 0;

        for (i, market) in self.prop_markets.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.prop_request_delay).await;
            }

            match self.fetch_event_odds(event_id, market).await {
                Ok(event) => {
                    let market_outcomes = event.prop_outcomes(market);
                    debug!("{} outcomes for {} in {}", market_outcomes.len(), market, event_id);
                    outcomes.extend(market_outcomes);
                    markets_ok += 1;
                }
                Err(e) => {
                    warn!("Skipping {} for {}: {:#}", market, event_id, e);
                    last_error = Some(e);
                }
            }
        }

        if markets_ok == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        self.cache_raw(&outcomes, props_cache_file(event_id));
        Ok(outcomes)
    }

    /// Check how many API requests you have remaining
    pub async fn check_usage(&self) -> Result<ApiUsage> {
        let url = format!("{}/sports", self.base_url);
        let _: serde_json::Value = self
            .get_json(&url, &[("apiKey", self.api_key.clone())])
            .await
            .context("Failed to check API usage")?;

        let usage = ApiUsage {
            remaining: self.budget.remaining(),
            used: self.budget.used(),
        };
        info!("API requests remaining: {:?}, used: {:?}", usage.remaining, usage.used);
        Ok(usage)
    }
}

#[async_trait]
impl OddsSource for OddsApiClient {
    async fn list_games(&self, week: u8) -> Result<Vec<RawGame>> {
        self.fetch_games(week).await
    }

    async fn list_player_props(&self, event_id: &str) -> Result<Vec<RawPropOutcome>> {
        self.fetch_player_props(event_id).await
    }

    fn requests_made(&self) -> u64 {
        self.budget.requests_made()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> OddsApiClient {
        let config = Config::from_lookup(|name| match name {
            "ODDS_API_KEY" => Some("key".to_string()),
            "SEASON_OPENER" => Some("2025-09-04".to_string()),
            _ => None,
        })
        .unwrap();
        OddsApiClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_games_query_limits_to_week() {
        let client = offline_client();
        let query = client.games_query(1);

        let get = |name: &str| {
            query
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("markets"), Some("h2h,spreads,totals"));
        assert_eq!(get("oddsFormat"), Some("american"));
        assert_eq!(get("commenceTimeFrom"), Some("2025-09-02T04:00:00Z"));
        assert_eq!(get("commenceTimeTo"), Some("2025-09-09T04:00:00Z"));
    }

    #[test]
    fn test_games_query_out_of_season() {
        let client = offline_client();
        let query = client.games_query(40);
        assert!(query.iter().all(|(k, _)| *k != "commenceTimeFrom"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_games() {
        dotenv::dotenv().ok();
        let config = Config::from_env().unwrap();
        let client = OddsApiClient::from_config(&config).unwrap();

        let week = config.calendar().week_of(chrono::Utc::now().date_naive()).unwrap_or(1);
        let games = client.fetch_games(week).await.unwrap();
        assert!(!games.is_empty());
        assert_eq!(client.requests_made(), 1);
    }

    #[tokio::test]
    #[ignore]
    async fn test_check_usage() {
        dotenv::dotenv().ok();
        let config = Config::from_env().unwrap();
        let client = OddsApiClient::from_config(&config).unwrap();

        let usage = client.check_usage().await.unwrap();
        assert!(usage.remaining.is_some());
    }
}
