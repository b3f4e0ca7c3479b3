use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod placeholder;
pub mod raw;

pub use raw::*;

/// Value written to the `data_source` column of every prop row
pub const DATA_SOURCE: &str = "odds_api";

/// Marker rendered for a player whose team could not be determined
pub const UNRESOLVED_TEAM: &str = "TBD";

/// Which side of the week an odds snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Opening,
    Final,
}

impl SnapshotKind {
    /// Snapshot 1 is the Tuesday opening collection, every other snapshot is a closing one
    pub fn for_snapshot(number: u8) -> Self {
        if number == 1 {
            SnapshotKind::Opening
        } else {
            SnapshotKind::Final
        }
    }
}

/// Spread, total and moneyline prices from one bookmaker at one point in time.
/// Odds are American format; a missing market leaves its fields unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsSnapshot {
    pub kind: SnapshotKind,
    pub spread_line: Option<f64>, // home team perspective
    pub spread_home_odds: Option<i32>,
    pub spread_away_odds: Option<i32>,
    pub total_line: Option<f64>,
    pub total_over_odds: Option<i32>,
    pub total_under_odds: Option<i32>,
    pub ml_home_odds: Option<i32>,
    pub ml_away_odds: Option<i32>,
    pub collected_at: DateTime<Utc>,
}

impl OddsSnapshot {
    pub fn empty(kind: SnapshotKind, collected_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            spread_line: None,
            spread_home_odds: None,
            spread_away_odds: None,
            total_line: None,
            total_over_odds: None,
            total_under_odds: None,
            ml_home_odds: None,
            ml_away_odds: None,
            collected_at,
        }
    }
}

/// One row of the Game_Lines tab: a game as quoted by a single bookmaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "GameLineRecord", from = "GameLineRecord")]
pub struct GameRow {
    pub game_id: String,
    pub date: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    pub bookmaker: String,
    pub opening: Option<OddsSnapshot>,
    pub closing: Option<OddsSnapshot>,
}

impl GameRow {
    pub fn key(&self) -> (String, String) {
        (self.game_id.clone(), self.bookmaker.clone())
    }

    pub fn snapshot_mut(&mut self, kind: SnapshotKind) -> &mut Option<OddsSnapshot> {
        match kind {
            SnapshotKind::Opening => &mut self.opening,
            SnapshotKind::Final => &mut self.closing,
        }
    }

    /// Fold a newer version of the same (game, bookmaker) row into this one.
    /// Snapshots present on `newer` replace ours; absent ones are kept.
    pub fn merge(&mut self, newer: GameRow) {
        self.date = newer.date;
        self.home_team = newer.home_team;
        self.away_team = newer.away_team;
        if newer.opening.is_some() {
            self.opening = newer.opening;
        }
        if newer.closing.is_some() {
            self.closing = newer.closing;
        }
    }
}

/// Flat serialized form of [`GameRow`] with `opening_*`/`final_*` columns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameLineRecord {
    pub game_id: String,
    pub date: Option<DateTime<Utc>>,
    pub home_team: String,
    pub away_team: String,
    pub bookmaker: String,
    pub opening_spread_line: Option<f64>,
    pub opening_spread_home_odds: Option<i32>,
    pub opening_spread_away_odds: Option<i32>,
    pub opening_collected_date: Option<DateTime<Utc>>,
    pub opening_total_line: Option<f64>,
    pub opening_total_over_odds: Option<i32>,
    pub opening_total_under_odds: Option<i32>,
    pub opening_ml_home: Option<i32>,
    pub opening_ml_away: Option<i32>,
    pub final_spread_line: Option<f64>,
    pub final_spread_home_odds: Option<i32>,
    pub final_spread_away_odds: Option<i32>,
    pub final_collected_date: Option<DateTime<Utc>>,
    pub final_total_line: Option<f64>,
    pub final_total_over_odds: Option<i32>,
    pub final_total_under_odds: Option<i32>,
    pub final_ml_home: Option<i32>,
    pub final_ml_away: Option<i32>,
}

impl From<GameRow> for GameLineRecord {
    fn from(row: GameRow) -> Self {
        let mut record = GameLineRecord {
            game_id: row.game_id,
            date: Some(row.date),
            home_team: row.home_team,
            away_team: row.away_team,
            bookmaker: row.bookmaker,
            ..Default::default()
        };

        if let Some(s) = row.opening {
            record.opening_spread_line = s.spread_line;
            record.opening_spread_home_odds = s.spread_home_odds;
            record.opening_spread_away_odds = s.spread_away_odds;
            record.opening_collected_date = Some(s.collected_at);
            record.opening_total_line = s.total_line;
            record.opening_total_over_odds = s.total_over_odds;
            record.opening_total_under_odds = s.total_under_odds;
            record.opening_ml_home = s.ml_home_odds;
            record.opening_ml_away = s.ml_away_odds;
        }

        if let Some(s) = row.closing {
            record.final_spread_line = s.spread_line;
            record.final_spread_home_odds = s.spread_home_odds;
            record.final_spread_away_odds = s.spread_away_odds;
            record.final_collected_date = Some(s.collected_at);
            record.final_total_line = s.total_line;
            record.final_total_over_odds = s.total_over_odds;
            record.final_total_under_odds = s.total_under_odds;
            record.final_ml_home = s.ml_home_odds;
            record.final_ml_away = s.ml_away_odds;
        }

        record
    }
}

impl From<GameLineRecord> for GameRow {
    fn from(r: GameLineRecord) -> Self {
        // A snapshot exists exactly when its collection time was recorded
        let opening = r.opening_collected_date.map(|collected_at| OddsSnapshot {
            kind: SnapshotKind::Opening,
            spread_line: r.opening_spread_line,
            spread_home_odds: r.opening_spread_home_odds,
            spread_away_odds: r.opening_spread_away_odds,
            total_line: r.opening_total_line,
            total_over_odds: r.opening_total_over_odds,
            total_under_odds: r.opening_total_under_odds,
            ml_home_odds: r.opening_ml_home,
            ml_away_odds: r.opening_ml_away,
            collected_at,
        });

        let closing = r.final_collected_date.map(|collected_at| OddsSnapshot {
            kind: SnapshotKind::Final,
            spread_line: r.final_spread_line,
            spread_home_odds: r.final_spread_home_odds,
            spread_away_odds: r.final_spread_away_odds,
            total_line: r.final_total_line,
            total_over_odds: r.final_total_over_odds,
            total_under_odds: r.final_total_under_odds,
            ml_home_odds: r.final_ml_home,
            ml_away_odds: r.final_ml_away,
            collected_at,
        });

        let date = r
            .date
            .or(r.opening_collected_date)
            .or(r.final_collected_date)
            .unwrap_or_default();

        GameRow {
            game_id: r.game_id,
            date,
            home_team: r.home_team,
            away_team: r.away_team,
            bookmaker: r.bookmaker,
            opening,
            closing,
        }
    }
}

/// Player prop markets requested from the API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PropMarket {
    PassYards,
    PassTouchdowns,
    RushYards,
    Receptions,
    ReceptionYards,
    AnytimeTouchdown,
    Other(String),
}

impl PropMarket {
    pub const ANYTIME_TD_KEY: &'static str = "player_anytime_td";

    pub fn from_key(key: &str) -> Self {
        match key {
            "player_pass_yds" => PropMarket::PassYards,
            "player_pass_tds" => PropMarket::PassTouchdowns,
            "player_rush_yds" => PropMarket::RushYards,
            "player_receptions" => PropMarket::Receptions,
            "player_reception_yds" => PropMarket::ReceptionYards,
            Self::ANYTIME_TD_KEY => PropMarket::AnytimeTouchdown,
            other => PropMarket::Other(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            PropMarket::PassYards => "player_pass_yds",
            PropMarket::PassTouchdowns => "player_pass_tds",
            PropMarket::RushYards => "player_rush_yds",
            PropMarket::Receptions => "player_receptions",
            PropMarket::ReceptionYards => "player_reception_yds",
            PropMarket::AnytimeTouchdown => Self::ANYTIME_TD_KEY,
            PropMarket::Other(key) => key,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            PropMarket::PassYards => "Passing Yards",
            PropMarket::PassTouchdowns => "Passing TDs",
            PropMarket::RushYards => "Rushing Yards",
            PropMarket::Receptions => "Receptions",
            PropMarket::ReceptionYards => "Receiving Yards",
            PropMarket::AnytimeTouchdown => "Anytime TD",
            PropMarket::Other(key) => key,
        }
    }

    /// Single-sided yes/no market, shaped separately from over/under props
    pub fn is_anytime_td(&self) -> bool {
        matches!(self, PropMarket::AnytimeTouchdown)
    }
}

impl From<PropMarket> for String {
    fn from(market: PropMarket) -> Self {
        market.display_name().to_string()
    }
}

impl From<String> for PropMarket {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Passing Yards" => PropMarket::PassYards,
            "Passing TDs" => PropMarket::PassTouchdowns,
            "Rushing Yards" => PropMarket::RushYards,
            "Receptions" => PropMarket::Receptions,
            "Receiving Yards" => PropMarket::ReceptionYards,
            "Anytime TD" => PropMarket::AnytimeTouchdown,
            key => PropMarket::from_key(key),
        }
    }
}

/// Display-only guess at a player's position based on the market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionHint {
    #[serde(rename = "QB")]
    Quarterback,
    #[serde(rename = "RB/QB")]
    Rusher,
    #[serde(rename = "WR/TE/RB")]
    Receiver,
    Unknown,
}

impl PositionHint {
    pub fn from_market(market: &PropMarket) -> Self {
        let name = market.display_name().to_lowercase();
        if name.contains("pass") {
            PositionHint::Quarterback
        } else if name.contains("rush") {
            PositionHint::Rusher
        } else if name.contains("receiv") {
            PositionHint::Receiver
        } else {
            PositionHint::Unknown
        }
    }
}

/// The odds feed carries no roster data, so a player's team stays
/// unresolved until something downstream fills it in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PlayerTeam {
    #[default]
    Unresolved,
    Known(String),
}

impl From<PlayerTeam> for String {
    fn from(team: PlayerTeam) -> Self {
        match team {
            PlayerTeam::Unresolved => UNRESOLVED_TEAM.to_string(),
            PlayerTeam::Known(name) => name,
        }
    }
}

impl From<String> for PlayerTeam {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == UNRESOLVED_TEAM {
            PlayerTeam::Unresolved
        } else {
            PlayerTeam::Known(trimmed.to_string())
        }
    }
}

/// One row of the Player_Props tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPropRow {
    pub game_id: String,
    pub player_name: String,
    #[serde(rename = "position")]
    pub position_hint: PositionHint,
    pub team: PlayerTeam,
    pub market_type: PropMarket,
    pub bookmaker: String,
    pub data_source: String,
    pub over_line: Option<f64>,
    pub over_odds: Option<i32>,
    pub under_line: Option<f64>,
    pub under_odds: Option<i32>,
    #[serde(rename = "collected_date")]
    pub collected_at: DateTime<Utc>,
    #[serde(default, with = "placeholder")]
    pub season_over_rate: Option<f64>,
    #[serde(default, with = "placeholder")]
    pub season_attempts: Option<f64>,
    #[serde(default, with = "placeholder")]
    pub vs_defense_rate: Option<f64>,
    #[serde(default, with = "placeholder")]
    pub recent_form_3g: Option<f64>,
    #[serde(default, with = "placeholder")]
    pub home_away_split: Option<f64>,
}

impl PlayerPropRow {
    pub fn key(&self) -> (String, String, String, String) {
        (
            self.game_id.clone(),
            self.player_name.clone(),
            self.market_type.key().to_string(),
            self.bookmaker.clone(),
        )
    }
}

/// One row of the Anytime_TD_Props tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnytimeTdRow {
    pub game_id: String,
    pub player_name: String,
    pub team: PlayerTeam,
    pub bookmaker: String,
    pub data_source: String,
    /// Price of "yes, scores a touchdown"
    #[serde(rename = "anytime_td_odds")]
    pub odds: Option<i32>,
    #[serde(rename = "collected_date")]
    pub collected_at: DateTime<Utc>,
    #[serde(default, with = "placeholder")]
    pub season_tds: Option<f64>,
    #[serde(default, with = "placeholder")]
    pub red_zone_targets: Option<f64>,
    #[serde(default, with = "placeholder")]
    pub goal_line_carries: Option<f64>,
    #[serde(default, with = "placeholder")]
    pub recent_td_rate: Option<f64>,
}

impl AnytimeTdRow {
    pub fn key(&self) -> (String, String, String) {
        (
            self.game_id.clone(),
            self.player_name.clone(),
            self.bookmaker.clone(),
        )
    }
}

/// Minimal view of a scheduled game, used for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub away_team: String,
    pub home_team: String,
    pub commence_time: Option<String>,
}

impl From<&RawGame> for GameSummary {
    fn from(game: &RawGame) -> Self {
        Self {
            away_team: game.away_team.clone(),
            home_team: game.home_team.clone(),
            commence_time: game.commence_time.clone(),
        }
    }
}

/// Records dropped during a run because they could not be shaped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecords {
    pub games: usize,
    pub bookmakers: usize,
    pub props: usize,
}

impl SkippedRecords {
    pub fn total(&self) -> usize {
        self.games + self.bookmakers + self.props
    }

    pub fn absorb(&mut self, other: SkippedRecords) {
        self.games += other.games;
        self.bookmakers += other.bookmakers;
        self.props += other.props;
    }
}

/// Everything collected for one snapshot of one week; the unit handed to a sheet store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResult {
    pub week: u8,
    pub snapshot: u8,
    pub snapshot_description: String,
    pub collection_timestamp: DateTime<Utc>,
    pub games_data: Vec<GameRow>,
    pub props_data: Vec<PlayerPropRow>,
    pub anytime_td_props_data: Vec<AnytimeTdRow>,
    #[serde(default)]
    pub skipped_records: SkippedRecords,
}

impl CollectionResult {
    pub fn kind(&self) -> SnapshotKind {
        SnapshotKind::for_snapshot(self.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_row() -> GameRow {
        let collected_at = Utc.with_ymd_and_hms(2025, 9, 2, 15, 0, 0).unwrap();
        let mut opening = OddsSnapshot::empty(SnapshotKind::Opening, collected_at);
        opening.spread_line = Some(-3.5);
        opening.ml_home_odds = Some(0);

        GameRow {
            game_id: "NFL_2025_2025-09-07_BALT_KANS".to_string(),
            date: Utc.with_ymd_and_hms(2025, 9, 7, 17, 0, 0).unwrap(),
            home_team: "Kansas City Chiefs".to_string(),
            away_team: "Baltimore Ravens".to_string(),
            bookmaker: "DraftKings".to_string(),
            opening: Some(opening),
            closing: None,
        }
    }

    #[test]
    fn test_game_row_flattens_to_prefixed_fields() {
        let value = serde_json::to_value(sample_row()).unwrap();

        assert_eq!(value["opening_spread_line"], -3.5);
        assert_eq!(value["opening_ml_home"], 0);
        assert!(value["opening_ml_away"].is_null());
        assert!(value["final_collected_date"].is_null());
        assert_eq!(value["bookmaker"], "DraftKings");
    }

    #[test]
    fn test_game_row_reads_back_snapshots() {
        let row = sample_row();
        let json = serde_json::to_string(&row).unwrap();
        let parsed: GameRow = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, row);
        assert!(parsed.closing.is_none());
    }

    #[test]
    fn test_merge_keeps_other_snapshot() {
        let mut existing = sample_row();
        let mut newer = sample_row();
        newer.opening = None;
        newer.closing = Some(OddsSnapshot::empty(SnapshotKind::Final, Utc::now()));

        existing.merge(newer);
        assert!(existing.opening.is_some());
        assert!(existing.closing.is_some());
    }

    #[test]
    fn test_prop_market_names() {
        assert_eq!(PropMarket::from_key("player_reception_yds").display_name(), "Receiving Yards");
        assert_eq!(PropMarket::from("Anytime TD".to_string()), PropMarket::AnytimeTouchdown);
        assert_eq!(
            PropMarket::from("player_kicking_points".to_string()),
            PropMarket::Other("player_kicking_points".to_string())
        );
        assert!(PropMarket::from_key("player_anytime_td").is_anytime_td());
    }

    #[test]
    fn test_position_hint() {
        assert_eq!(
            PositionHint::from_market(&PropMarket::PassTouchdowns),
            PositionHint::Quarterback
        );
        assert_eq!(PositionHint::from_market(&PropMarket::RushYards), PositionHint::Rusher);
        assert_eq!(PositionHint::from_market(&PropMarket::ReceptionYards), PositionHint::Receiver);
        assert_eq!(PositionHint::from_market(&PropMarket::Receptions), PositionHint::Unknown);
    }

    #[test]
    fn test_unresolved_team_marker() {
        assert_eq!(String::from(PlayerTeam::Unresolved), "TBD");
        assert_eq!(PlayerTeam::from("TBD".to_string()), PlayerTeam::Unresolved);
        assert_eq!(
            PlayerTeam::from("Kansas City Chiefs".to_string()),
            PlayerTeam::Known("Kansas City Chiefs".to_string())
        );
    }
}
