use crate::models::CollectionResult;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Save any serializable value to a pretty-printed JSON file, creating
/// parent directories as needed
pub fn save_to_cache<T: Serialize + ?Sized>(data: &T, cache_file: impl AsRef<Path>) -> Result<()> {
    let cache_file = cache_file.as_ref();
    if let Some(parent) = cache_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(data).context("Failed to serialize cache data")?;
    std::fs::write(cache_file, json)
        .with_context(|| format!("Failed to write cache file {}", cache_file.display()))?;
    Ok(())
}

/// Load a JSON cache file
pub fn load_from_cache<T: DeserializeOwned>(cache_file: impl AsRef<Path>) -> Result<T> {
    let cache_file = cache_file.as_ref();
    let json = std::fs::read_to_string(cache_file)
        .with_context(|| format!("Failed to read cache file {}", cache_file.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to deserialize {}", cache_file.display()))
}

/// Archive a collection package as
/// `week_{n}_snapshot_{m}_{YYYYmmdd_HHMMSS}.json` under `dir`
pub fn save_collection_package(
    result: &CollectionResult,
    dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let filename = format!(
        "week_{}_snapshot_{}_{}.json",
        result.week,
        result.snapshot,
        result.collection_timestamp.format("%Y%m%d_%H%M%S")
    );
    let path = dir.as_ref().join(filename);
    save_to_cache(result, &path)?;
    Ok(path)
}
