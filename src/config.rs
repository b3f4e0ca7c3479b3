use crate::schedule::SeasonCalendar;
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com/v4";
pub const DEFAULT_SPORT: &str = "americanfootball_nfl";
pub const DEFAULT_GAME_MARKETS: &str = "h2h,spreads,totals";
pub const DEFAULT_PROP_MARKETS: &str = "player_pass_yds,player_pass_tds,player_rush_yds,\
player_receptions,player_reception_yds,player_anytime_td";

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    odds_api_key: Option<String>,
    pub base_url: String,
    pub sport: String,
    pub regions: String,
    pub game_markets: String,
    pub prop_markets: Vec<String>,
    pub requests_per_minute: u32,
    pub prop_request_delay: Duration,
    pub game_delay: Duration,
    pub season_opener: NaiveDate,
    pub workbook_dir: PathBuf,
    pub collected_data_dir: PathBuf,
    pub raw_data_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let season_opener = match get("SEASON_OPENER") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .with_context(|| format!("SEASON_OPENER must be YYYY-MM-DD, got {:?}", raw))?,
            None => NaiveDate::from_ymd_opt(2025, 9, 4)
                .ok_or_else(|| anyhow!("invalid default opener"))?,
        };

        let requests_per_minute: u32 = parse_or(&get, "REQUESTS_PER_MINUTE", 500)?;
        if requests_per_minute == 0 {
            bail!("REQUESTS_PER_MINUTE must be greater than zero");
        }

        Ok(Self {
            odds_api_key: get("ODDS_API_KEY").map(|k| k.trim().to_string()),
            base_url: or("ODDS_API_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            sport: or("ODDS_API_SPORT", DEFAULT_SPORT),
            regions: or("ODDS_API_REGIONS", "us"),
            game_markets: or("ODDS_API_MARKETS", DEFAULT_GAME_MARKETS),
            prop_markets: or("PROP_MARKETS", DEFAULT_PROP_MARKETS)
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect(),
            requests_per_minute,
            prop_request_delay: Duration::from_millis(parse_or(
                &get,
                "PROP_REQUEST_DELAY_MS",
                200,
            )?),
            game_delay: Duration::from_millis(parse_or(&get, "GAME_DELAY_MS", 500)?),
            season_opener,
            workbook_dir: PathBuf::from(or("WORKBOOK_DIR", "workbook")),
            collected_data_dir: PathBuf::from(or("COLLECTED_DATA_DIR", "collected_data")),
            raw_data_dir: get("RAW_DATA_DIR").map(PathBuf::from),
        })
    }

    /// API key for live collection. Missing keys and the `.env.example`
    /// placeholder are rejected.
    pub fn api_key(&self) -> Result<&str> {
        match self.odds_api_key.as_deref() {
            Some(key) if !key.starts_with("your_") => Ok(key),
            Some(_) => bail!("ODDS_API_KEY still holds the placeholder value"),
            None => bail!("ODDS_API_KEY not set in environment or .env file"),
        }
    }

    pub fn calendar(&self) -> SeasonCalendar {
        SeasonCalendar::new(self.season_opener)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value {:?}", name, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.sport, "americanfootball_nfl");
        assert_eq!(config.prop_markets.len(), 6);
        assert_eq!(config.requests_per_minute, 500);
        assert_eq!(config.prop_request_delay, Duration::from_millis(200));
        assert_eq!(config.game_delay, Duration::from_millis(500));
        assert_eq!(config.season_opener, NaiveDate::from_ymd_opt(2025, 9, 4).unwrap());
        assert!(config.raw_data_dir.is_none());
        assert!(config.api_key().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("ODDS_API_KEY", " abc123 "),
            ("ODDS_API_BASE_URL", "http://localhost:8080/v4/"),
            ("PROP_MARKETS", "player_pass_yds, player_anytime_td,"),
            ("GAME_DELAY_MS", "0"),
            ("SEASON_OPENER", "2026-09-10"),
            ("RAW_DATA_DIR", "raw"),
        ])
        .unwrap();

        assert_eq!(config.api_key().unwrap(), "abc123");
        assert_eq!(config.base_url, "http://localhost:8080/v4");
        assert_eq!(config.prop_markets, vec!["player_pass_yds", "player_anytime_td"]);
        assert_eq!(config.game_delay, Duration::ZERO);
        let opener = NaiveDate::from_ymd_opt(2026, 9, 10).unwrap();
        assert_eq!(config.calendar().week_of(opener), Some(1));
        assert_eq!(config.raw_data_dir, Some(PathBuf::from("raw")));
    }

    #[test]
    fn test_placeholder_key_rejected() {
        let config = config(&[("ODDS_API_KEY", "your_api_key_here")]).unwrap();
        assert!(config.api_key().is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config(&[("REQUESTS_PER_MINUTE", "lots")]).is_err());
        assert!(config(&[("REQUESTS_PER_MINUTE", "0")]).is_err());
        assert!(config(&[("SEASON_OPENER", "September")]).is_err());
    }
}
