use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

pub const DEFAULT_UNDO_CAPACITY: usize = 200;
pub const DEFAULT_RECENCY_THRESHOLD_DAYS: i64 = 7;

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_undo_capacity")]
    pub undo_capacity: usize,
    #[serde(default = "default_recency_threshold_days")]
    pub recency_threshold_days: i64,
}

fn default_db_path() -> String {
    "super_duper.db".to_string()
}

fn default_undo_capacity() -> usize {
    DEFAULT_UNDO_CAPACITY
}

fn default_recency_threshold_days() -> i64 {
    DEFAULT_RECENCY_THRESHOLD_DAYS
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            undo_capacity: DEFAULT_UNDO_CAPACITY,
            recency_threshold_days: DEFAULT_RECENCY_THRESHOLD_DAYS,
        }
    }
}

impl ReviewConfig {
    fn normalized(mut self) -> Self {
        self.undo_capacity = self.undo_capacity.max(1);
        self
    }
}

/// Load settings from an optional `Config` file, then `SD_REVIEW_*` environment variables.
pub fn load_configuration() -> Result<ReviewConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("SD_REVIEW").try_parsing(true))
        .build()?;
    builder
        .try_deserialize::<ReviewConfig>()
        .map(ReviewConfig::normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(source: &str) -> ReviewConfig {
        Config::builder()
            .add_source(ConfigFile::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize::<ReviewConfig>()
            .unwrap()
            .normalized()
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = from_toml("");
        assert_eq!(config.db_path, "super_duper.db");
        assert_eq!(config.undo_capacity, 200);
        assert_eq!(config.recency_threshold_days, 7);
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let config = from_toml(
            "db_path = \"review.db\"\nundo_capacity = 50\nrecency_threshold_days = 30\n",
        );
        assert_eq!(config.db_path, "review.db");
        assert_eq!(config.undo_capacity, 50);
        assert_eq!(config.recency_threshold_days, 30);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let config = from_toml("undo_capacity = 0\n");
        assert_eq!(config.undo_capacity, 1);
    }
}
