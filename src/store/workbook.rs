use super::{SheetStore, WriteSummary};
use crate::models::{AnytimeTdRow, CollectionResult, GameRow, PlayerPropRow, PlayerTeam};
use crate::utils::data::{load_from_cache, save_to_cache};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const GAME_LINES_FILE: &str = "Game_Lines.csv";
pub const PLAYER_PROPS_FILE: &str = "Player_Props.csv";
pub const ANYTIME_TD_FILE: &str = "Anytime_TD_Props.csv";
pub const OVERVIEW_FILE: &str = "Overview.json";

/// Collection status of one snapshot within a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStatus {
    pub description: String,
    pub collected_at: DateTime<Utc>,
    pub games: usize,
    pub props: usize,
    pub anytime_td_props: usize,
}

/// Per-week summary sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub week: u8,
    pub snapshots: BTreeMap<u8, SnapshotStatus>,
}

/// A directory-backed workbook: one folder per week, one CSV per tab
pub struct WorkbookStore {
    root: PathBuf,
}

impl WorkbookStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn week_dir(&self, week: u8) -> PathBuf {
        self.root.join(format!("week_{}", week))
    }

    pub fn overview(&self, week: u8) -> Result<Overview> {
        let path = self.week_dir(week).join(OVERVIEW_FILE);
        if !path.exists() {
            return Ok(Overview {
                week,
                ..Default::default()
            });
        }
        load_from_cache(&path)
    }

    pub fn game_lines(&self, week: u8) -> Result<Vec<GameRow>> {
        read_tab(&self.week_dir(week).join(GAME_LINES_FILE))
    }

    pub fn player_props(&self, week: u8) -> Result<Vec<PlayerPropRow>> {
        read_tab(&self.week_dir(week).join(PLAYER_PROPS_FILE))
    }

    pub fn anytime_td_props(&self, week: u8) -> Result<Vec<AnytimeTdRow>> {
        read_tab(&self.week_dir(week).join(ANYTIME_TD_FILE))
    }

    fn write_all(&self, result: &CollectionResult) -> Result<WriteSummary> {
        let dir = self.week_dir(result.week);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create workbook directory {}", dir.display()))?;

        let mut summary = WriteSummary::default();

        let mut games = self.game_lines(result.week)?;
        (summary.games_inserted, summary.games_updated) =
            upsert(&mut games, &result.games_data, GameRow::key, GameRow::merge);
        write_tab(&dir.join(GAME_LINES_FILE), &games)?;

        // Prop tabs are only touched when there is something to write
        if !result.props_data.is_empty() {
            let mut props = self.player_props(result.week)?;
            (summary.props_inserted, summary.props_updated) =
                upsert(&mut props, &result.props_data, PlayerPropRow::key, merge_prop);
            write_tab(&dir.join(PLAYER_PROPS_FILE), &props)?;
        }

        if !result.anytime_td_props_data.is_empty() {
            let mut td_props = self.anytime_td_props(result.week)?;
            (summary.anytime_td_inserted, summary.anytime_td_updated) = upsert(
                &mut td_props,
                &result.anytime_td_props_data,
                AnytimeTdRow::key,
                merge_anytime_td,
            );
            write_tab(&dir.join(ANYTIME_TD_FILE), &td_props)?;
        }

        let mut overview = self.overview(result.week)?;
        overview.week = result.week;
        overview.snapshots.insert(
            result.snapshot,
            SnapshotStatus {
                description: result.snapshot_description.clone(),
                collected_at: result.collection_timestamp,
                games: result.games_data.len(),
                props: result.props_data.len(),
                anytime_td_props: result.anytime_td_props_data.len(),
            },
        );
        save_to_cache(&overview, dir.join(OVERVIEW_FILE))?;

        Ok(summary)
    }
}

#[async_trait]
impl SheetStore for WorkbookStore {
    async fn collected_snapshots(&self, week: u8) -> Result<Vec<u8>> {
        Ok(self.overview(week)?.snapshots.keys().copied().collect())
    }

    async fn persist(&self, result: &CollectionResult) -> Result<WriteSummary> {
        let summary = self.write_all(result)?;
        info!(
            "Workbook week {} snapshot {}: {} games inserted, {} updated; \
             {} props inserted, {} updated; {} TD props inserted, {} updated",
            result.week,
            result.snapshot,
            summary.games_inserted,
            summary.games_updated,
            summary.props_inserted,
            summary.props_updated,
            summary.anytime_td_inserted,
            summary.anytime_td_updated
        );
        Ok(summary)
    }
}

/// Insert rows with new keys and fold rows with known keys into their
/// existing counterpart. Returns (inserted, updated).
fn upsert<T, K>(
    existing: &mut Vec<T>,
    incoming: &[T],
    key: impl Fn(&T) -> K,
    merge: impl Fn(&mut T, T),
) -> (usize, usize)
where
    T: Clone,
    K: Eq + Hash,
{
    let mut index: HashMap<K, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, row)| (key(row), i))
        .collect();

    let (mut inserted, mut updated) = (0, 0);
    for row in incoming {
        match index.get(&key(row)) {
            Some(&i) => {
                merge(&mut existing[i], row.clone());
                updated += 1;
            }
            None => {
                index.insert(key(row), existing.len());
                existing.push(row.clone());
                inserted += 1;
            }
        }
    }

    (inserted, updated)
}

// Prices and lines come from the feed; team and reference statistics may
// have been filled in by hand and survive a re-collection.
fn merge_prop(existing: &mut PlayerPropRow, newer: PlayerPropRow) {
    let team = keep_known_team(&existing.team, newer.team);
    *existing = PlayerPropRow {
        team,
        season_over_rate: newer.season_over_rate.or(existing.season_over_rate),
        season_attempts: newer.season_attempts.or(existing.season_attempts),
        vs_defense_rate: newer.vs_defense_rate.or(existing.vs_defense_rate),
        recent_form_3g: newer.recent_form_3g.or(existing.recent_form_3g),
        home_away_split: newer.home_away_split.or(existing.home_away_split),
        ..newer
    };
}

fn merge_anytime_td(existing: &mut AnytimeTdRow, newer: AnytimeTdRow) {
    let team = keep_known_team(&existing.team, newer.team);
    *existing = AnytimeTdRow {
        team,
        season_tds: newer.season_tds.or(existing.season_tds),
        red_zone_targets: newer.red_zone_targets.or(existing.red_zone_targets),
        goal_line_carries: newer.goal_line_carries.or(existing.goal_line_carries),
        recent_td_rate: newer.recent_td_rate.or(existing.recent_td_rate),
        ..newer
    };
}

fn keep_known_team(existing: &PlayerTeam, newer: PlayerTeam) -> PlayerTeam {
    match newer {
        PlayerTeam::Unresolved => existing.clone(),
        known => known,
    }
}

fn read_tab<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.with_context(|| format!("Failed to read row of {}", path.display()))?);
    }
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Rewrite a whole tab, swapping it in only after it has been fully written
fn write_tab<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("Failed to write row to {}", path.display()))?;
        }
        writer.flush()?;
    }

    std::fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
