//! Serde adapter for reference statistics that are not available yet.
//!
//! Internally these are plain `Option<f64>`; only the serialized form
//! carries the "N/A" sentinel shown in the sheet.

use serde::{Deserialize, Deserializer, Serializer};

pub const NOT_AVAILABLE: &str = "N/A";

pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_str(NOT_AVAILABLE),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Cell {
    Number(f64),
    Text(String),
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Cell>::deserialize(deserializer)? {
        Some(Cell::Number(n)) => Some(n),
        Some(Cell::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Stats {
        #[serde(default, with = "crate::models::placeholder")]
        season_tds: Option<f64>,
    }

    #[test]
    fn test_missing_value_renders_sentinel() {
        let json = serde_json::to_string(&Stats { season_tds: None }).unwrap();
        assert_eq!(json, r#"{"season_tds":"N/A"}"#);

        let json = serde_json::to_string(&Stats { season_tds: Some(0.0) }).unwrap();
        assert_eq!(json, r#"{"season_tds":0.0}"#);
    }

    #[test]
    fn test_sentinel_reads_back_as_none() {
        let stats: Stats = serde_json::from_str(r#"{"season_tds":"N/A"}"#).unwrap();
        assert_eq!(stats.season_tds, None);

        let stats: Stats = serde_json::from_str(r#"{"season_tds":7}"#).unwrap();
        assert_eq!(stats.season_tds, Some(7.0));

        let stats: Stats = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(stats.season_tds, None);
    }
}
