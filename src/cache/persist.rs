//! Durable-tier persistence as a single JSON document.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use super::CacheEntry;

/// Load all durable entries from `path`. A missing or empty file is an
/// empty cache, not an error.
pub fn load_entries(path: &Path) -> Result<HashMap<String, CacheEntry>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cache file: {:?}", path))?;
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse cache file: {:?}", path))
}

/// Write the full durable map to `path`, replacing the previous document.
pub fn save_entries(path: &Path, entries: &HashMap<String, CacheEntry>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory: {:?}", parent))?;
        }
    }
    let json =
        serde_json::to_string_pretty(entries).with_context(|| "Failed to serialize cache")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write cache file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(url: &str) -> CacheEntry {
        CacheEntry {
            url: url.to_string(),
            timestamp: Utc::now(),
            title: None,
            source: None,
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load_entries(&dir.path().join("nope.json")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covers.json");

        let mut entries = HashMap::new();
        entries.insert(
            "wikimedia:Metroid:nes".to_string(),
            entry("https://img.example/metroid.jpg"),
        );
        save_entries(&path, &entries).unwrap();

        let reloaded = load_entries(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(
            reloaded["wikimedia:Metroid:nes"].url,
            "https://img.example/metroid.jpg"
        );
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/covers.json");
        save_entries(&path, &HashMap::new()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covers.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_entries(&path).is_err());
    }
}
