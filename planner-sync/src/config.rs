//! Layered configuration using figment
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. A config file: an explicit path, or the first of `planner.toml`,
//!    `planner.yaml`, `planner.yml`, `planner.json` found in the working
//!    directory
//! 3. Environment variables prefixed `PLANNER_`, with `__` separating
//!    nested keys (`PLANNER_API__BASE_URL`)

use crate::error::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use planner_board::{BoardError, BoardId, DragConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PLANNER_";

/// Largest accepted `api.max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// File names searched when no explicit path is given, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "planner.toml",
    "planner.yaml",
    "planner.yml",
    "planner.json",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server root, e.g. `http://localhost:4000`
    pub base_url: String,
    /// Board to open on start
    pub board_id: Option<String>,
    pub timeout_ms: u64,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Base delay, doubled on every retry
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            board_id: None,
            timeout_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Parsed base URL; `http` and `https` only
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(url::ParseError::RelativeUrlWithoutBase.into()),
        }
    }

    pub fn board_id(&self) -> Option<BoardId> {
        self.board_id.as_deref().map(BoardId::from)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Capacity of the failure notice channel
    pub notice_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { notice_buffer: 64 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub api: ApiConfig,
    pub drag: DragConfig,
    pub sync: SyncConfig,
}

impl PlannerConfig {
    /// Load from defaults, a discovered config file and the environment
    pub fn load() -> Result<Self> {
        Self::extract(Self::figment(discover(Path::new("."))))
    }

    /// Load with an explicit config file instead of discovery
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::extract(Self::figment(Some(path.as_ref().to_path_buf())))
    }

    /// Build the layered figment
    pub fn figment(file: Option<PathBuf>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            debug!(path = %path.display(), "using config file");
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.drag.validate()?;
        self.api.base_url()?;
        if self.api.max_retries > MAX_RETRIES_LIMIT {
            return Err(BoardError::invalid_config(
                "api.max_retries",
                format!("must be at most {MAX_RETRIES_LIMIT}"),
            )
            .into());
        }
        Ok(())
    }
}

/// First known config file in `dir`
fn discover(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:4000");
        assert_eq!(config.api.max_retries, 3);
        assert_eq!(config.drag.activation_distance, 5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("planner.toml");
        fs::write(
            &path,
            "[api]\nbase_url = \"https://boards.example.com\"\nboard_id = \"b1\"\n\n[drag]\nactivation_distance = 8.0\n",
        )
        .unwrap();

        let config = PlannerConfig::extract(PlannerConfig::figment(Some(path))).unwrap();
        assert_eq!(config.api.base_url, "https://boards.example.com");
        assert_eq!(config.api.board_id(), Some(BoardId::from("b1")));
        assert_eq!(config.drag.activation_distance, 8.0);
        // Untouched keys keep their defaults
        assert_eq!(config.api.timeout_ms, 10_000);
    }

    #[test]
    fn test_yaml_and_json_files() {
        let temp = TempDir::new().unwrap();
        let yaml = temp.path().join("planner.yaml");
        fs::write(&yaml, "sync:\n  notice_buffer: 8\n").unwrap();
        let config = PlannerConfig::extract(PlannerConfig::figment(Some(yaml))).unwrap();
        assert_eq!(config.sync.notice_buffer, 8);

        let json = temp.path().join("planner.json");
        fs::write(&json, r#"{"api": {"max_retries": 0}}"#).unwrap();
        let config = PlannerConfig::extract(PlannerConfig::figment(Some(json))).unwrap();
        assert_eq!(config.api.max_retries, 0);
    }

    #[test]
    fn test_discover_prefers_toml() {
        let temp = TempDir::new().unwrap();
        assert!(discover(temp.path()).is_none());

        fs::write(temp.path().join("planner.json"), "{}").unwrap();
        fs::write(temp.path().join("planner.toml"), "").unwrap();
        assert_eq!(
            discover(temp.path()),
            Some(temp.path().join("planner.toml"))
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("planner.toml");

        fs::write(&path, "[drag]\nactivation_distance = 0.0\n").unwrap();
        let err = PlannerConfig::extract(PlannerConfig::figment(Some(path.clone()))).unwrap_err();
        assert!(matches!(err, SyncError::Board(_)));

        fs::write(&path, "[api]\nbase_url = \"not a url\"\n").unwrap();
        let err = PlannerConfig::extract(PlannerConfig::figment(Some(path.clone()))).unwrap_err();
        assert!(matches!(err, SyncError::InvalidUrl(_)));

        fs::write(&path, "[api]\nmax_retries = 64\n").unwrap();
        let err = PlannerConfig::extract(PlannerConfig::figment(Some(path.clone()))).unwrap_err();
        assert!(matches!(err, SyncError::Board(_)));

        fs::write(&path, "[api]\nmax_retries = \"lots\"\n").unwrap();
        let err = PlannerConfig::extract(PlannerConfig::figment(Some(path))).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }
}
