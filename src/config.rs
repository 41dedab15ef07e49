use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Tuning knobs for the filename matcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Fuzzy candidates must score strictly above this to be suggested.
    pub suggestion_threshold: f64,
    /// Candidates must score at least this before the host acts on them unattended.
    pub auto_action_threshold: f64,
    pub prefix_weight: f64,
    pub keyword_weight: f64,
    /// Prefix of the fallback search link; the search term is appended percent-encoded.
    pub search_base_url: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            suggestion_threshold: 0.35,
            auto_action_threshold: 0.80,
            prefix_weight: 0.6,
            keyword_weight: 0.4,
            search_base_url: "https://booth.pm/search/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application state document holding the `boothMappings` field.
    pub data_file: PathBuf,
    pub storage: StorageBackend,
    pub sqlite_path: PathBuf,
    pub matching: MatchConfig,
    pub thumbnail_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data.json"),
            storage: StorageBackend::Json,
            sqlite_path: PathBuf::from("data.db"),
            matching: MatchConfig::default(),
            thumbnail_timeout_seconds: 10,
        }
    }
}

/// Loads the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{ "storage": "sqlite", "matching": { "auto_action_threshold": 0.9 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.storage, StorageBackend::Sqlite);
        assert_eq!(cfg.matching.auto_action_threshold, 0.9);
        assert_eq!(cfg.matching.suggestion_threshold, 0.35);
        assert_eq!(cfg.data_file, PathBuf::from("data.json"));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("config.json")).unwrap();
        assert_eq!(cfg.storage, StorageBackend::Json);
        assert_eq!(cfg.thumbnail_timeout_seconds, 10);
    }
}
