use std::path::{Path, PathBuf};
use config::{Config, Environment, File};
use serde::Deserialize;
use crate::core::QueryError;

/// Engine configuration
///
/// Priority: programmatic overrides > `LOGQUERY_*` environment > config file > defaults
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Culture name; empty means invariant
    pub culture: String,
    pub case_sensitive: bool,
    pub delimiter: String,
    /// `off`, `on` or `rule`
    pub heading: String,
    pub auto_size: bool,
    pub use_original_columns: bool,
    /// Defaults to the process working directory
    pub current_directory: Option<PathBuf>,
    /// Relative paths resolve against the current directory
    pub log_file: Option<PathBuf>,
    pub log_max_bytes: u64,
    pub log_backups: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            culture: String::new(),
            case_sensitive: false,
            delimiter: "\t".to_string(),
            heading: "on".to_string(),
            auto_size: false,
            use_original_columns: true,
            current_directory: None,
            log_file: None,
            log_max_bytes: 1024 * 1024, // 1MB
            log_backups: 3,
        }
    }
}

impl EngineConfig {
    pub const ENV_PREFIX: &'static str = "LOGQUERY";

    /// Loads the optional config file, then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, QueryError> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            if !path.exists() {
                return Err(QueryError::Config(format!("config file {} not found", path.display())));
            }
            builder = builder.add_source(File::from(path));
            log::debug!("loaded config from {}", path.display());
        }

        builder = builder.add_source(
            Environment::with_prefix(Self::ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize::<Self>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.delimiter, "\t");
        assert_eq!(config.heading, "on");
        assert!(config.use_original_columns);
        assert_eq!(config.log_max_bytes, 1_048_576);
    }

    #[test]
    fn test_load_file_with_partial_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lq.toml");
        fs::write(&path, "culture = \"de-DE\"\ncase_sensitive = true\nlog_backups = 5\n").unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.culture, "de-DE");
        assert!(config.case_sensitive);
        assert_eq!(config.log_backups, 5);
        assert_eq!(config.delimiter, "\t");
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::load(Some(Path::new("/nonexistent/lq.toml")));
        assert!(matches!(result, Err(QueryError::Config(_))));
    }
}
