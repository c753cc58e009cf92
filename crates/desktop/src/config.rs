//! Runtime configuration

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::counter::{DEFAULT_COUNT, DIGIT_COUNT};
use crate::dock::RestorePolicy;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Explicit per-builder config document paths.
///
/// Unset entries fall through to `./<name>.json` and then
/// `./config/<name>.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfigs {
    pub header: Option<String>,
    pub menubar: Option<String>,
    pub desktop: Option<String>,
    /// Single-path override for socials (default `./config/socials.json`)
    pub socials: Option<String>,
    /// Single-path override for projects (default `./config/projects.json`)
    pub projects: Option<String>,
}

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where restored windows go back into the grid
    pub restore_policy: RestorePolicy,

    /// Origin used to resolve root-relative preview URLs
    pub site_origin: String,

    /// Count shown by the visitor counter when nothing is stored
    pub default_visitor_count: String,

    /// JSON file persisting the visitor count (none = display only)
    pub counter_store: Option<PathBuf>,

    /// Explicit config document paths
    pub page_configs: PageConfigs,

    /// Document containers: element id -> document config path
    pub documents: IndexMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            restore_policy: RestorePolicy::default(),
            site_origin: "http://localhost/".to_string(),
            default_visitor_count: DEFAULT_COUNT.to_string(),
            counter_store: None,
            page_configs: PageConfigs::default(),
            documents: IndexMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("retrodesk/config.toml")),
            Some(PathBuf::from("/etc/retrodesk/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::info!(?path, policy = ?config.restore_policy, "loaded configuration");
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!(?path, error = %e, "failed to load config");
                    }
                }
            }
        }

        tracing::info!("using default configuration");
        Self::default()
    }

    /// Read, parse and validate one config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the page cannot display
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = &self.default_visitor_count;
        if count.is_empty() {
            return Err(ConfigError::Invalid("default_visitor_count is empty".into()));
        }
        if !count.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid(format!(
                "default_visitor_count {count:?} is not a number"
            )));
        }
        if count.len() > DIGIT_COUNT {
            return Err(ConfigError::Invalid(format!(
                "default_visitor_count {count:?} has more than {DIGIT_COUNT} digits"
            )));
        }
        Ok(())
    }
}

/// Helper for getting XDG directories
mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Config::default tests ==========

    #[test]
    fn config_default_has_expected_values() {
        let config = Config::default();

        assert_eq!(config.restore_policy, RestorePolicy::OriginalIndex);
        assert_eq!(config.default_visitor_count, "001998");
        assert_eq!(config.site_origin, "http://localhost/");
        assert!(config.counter_store.is_none());
        assert!(config.documents.is_empty());
        assert_eq!(config.page_configs, PageConfigs::default());
        assert!(config.validate().is_ok());
    }

    // ========== TOML tests ==========

    #[test]
    fn config_partial_toml_uses_defaults() {
        let partial_toml = r#"
            restore_policy = "before_docks"

            [documents]
            "resume-container" = "./config/resume.json"
            "about-container" = "./config/about.json"
        "#;

        let parsed: Config = toml::from_str(partial_toml).expect("Failed to parse partial TOML");

        assert_eq!(parsed.restore_policy, RestorePolicy::BeforeDocks);
        let ids: Vec<_> = parsed.documents.keys().cloned().collect();
        assert_eq!(ids, vec!["resume-container", "about-container"]);

        assert_eq!(parsed.default_visitor_count, "001998");
        assert!(parsed.page_configs.menubar.is_none());
    }

    #[test]
    fn config_page_configs_section() {
        let parsed: Config = toml::from_str(
            r#"
            [page_configs]
            menubar = "./pages/blog/menubar.json"
            projects = "./pages/blog/projects.json"
        "#,
        )
        .expect("Failed to parse TOML");

        assert_eq!(parsed.page_configs.menubar.as_deref(), Some("./pages/blog/menubar.json"));
        assert_eq!(parsed.page_configs.projects.as_deref(), Some("./pages/blog/projects.json"));
        assert!(parsed.page_configs.header.is_none());
    }

    #[test]
    fn config_invalid_toml_returns_error() {
        let result: Result<Config, _> = toml::from_str("this is not valid { toml [");
        assert!(result.is_err());
    }

    // ========== validate tests ==========

    #[test]
    fn validate_rejects_empty_count() {
        let mut config = Config::default();
        config.default_visitor_count = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_count_longer_than_digits() {
        let mut config = Config::default();
        config.default_visitor_count = "1234567".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.default_visitor_count = "123456".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_digits() {
        let mut config = Config::default();
        config.default_visitor_count = "12a".into();
        assert!(config.validate().is_err());
    }

    // ========== from_file tests ==========

    #[test]
    fn from_file_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "default_visitor_count = \"42\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.default_visitor_count, "42");

        std::fs::write(&path, "default_visitor_count = \"\"\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
