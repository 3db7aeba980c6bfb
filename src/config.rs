use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

pub const DB_PATH_ENV: &str = "RANKSERIES_DB_PATH";
pub const HARVEST_CMD_ENV: &str = "RANKSERIES_HARVEST_CMD";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// Program and leading arguments of the external scraper. Empty means no
    /// harvesting.
    pub harvest_command: Vec<String>,
    pub harvest_timeout_secs: u64,
    pub harvest_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("rankseries.sqlite3"),
            harvest_command: Vec::new(),
            harvest_timeout_secs: 120,
            harvest_interval_secs: 3600,
        }
    }
}

impl AppConfig {
    /// Reads the config file if one is given and exists, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db_path) = lookup(DB_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.database_path = PathBuf::from(db_path.trim());
        }
        if let Some(command) = lookup(HARVEST_CMD_ENV) {
            self.harvest_command = command.split_whitespace().map(str::to_string).collect();
        }
    }

    pub fn harvest_timeout(&self) -> Duration {
        Duration::from_secs(self.harvest_timeout_secs.max(1))
    }

    pub fn harvest_interval(&self) -> Duration {
        Duration::from_secs(self.harvest_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");

        let config = AppConfig::load(Some(missing.as_path())).unwrap();
        assert_eq!(config.harvest_timeout_secs, 120);
        assert_eq!(config.harvest_interval_secs, 3600);
        assert!(AppConfig::from_file(&missing).is_err());

        let mut config = AppConfig::default();
        config.apply_overrides(|_| None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.harvest_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn zero_durations_are_clamped() {
        let config = AppConfig {
            harvest_timeout_secs: 0,
            harvest_interval_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.harvest_timeout(), Duration::from_secs(1));
        assert_eq!(config.harvest_interval(), Duration::from_secs(1));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"harvest_command": ["scrape", "--headless"]}"#).unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.harvest_command, vec!["scrape", "--headless"]);
        assert_eq!(config.harvest_timeout_secs, 120);
        assert_eq!(config.database_path, PathBuf::from("rankseries.sqlite3"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (DB_PATH_ENV, " /tmp/stats.sqlite3 "),
            (HARVEST_CMD_ENV, "node  scrape.js --fast"),
        ]);

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_path, PathBuf::from("/tmp/stats.sqlite3"));
        assert_eq!(config.harvest_command, vec!["node", "scrape.js", "--fast"]);
    }
}
