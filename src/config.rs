//! Bridge configuration snapshot
//!
//! Everything the locator and supervisor need from the environment is
//! captured here once, at session start. An optional TOML file can replace
//! the launch table and add environment variables for the backend.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::backend::candidates::{default_candidates, CandidateStrategy, INSTALL_HINT};
use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "GOOGLE_AUTOMATION_MCP_BRIDGE_CONFIG";

/// Forces the Python backend to flush stdout immediately
const UNBUFFERED_ENV: (&str, &str) = ("PYTHONUNBUFFERED", "1");

/// Immutable settings for one bridge session
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Launch strategies, tried in order
    pub candidates: Vec<CandidateStrategy>,

    /// Run candidates through the platform command shell
    pub use_shell: bool,

    /// Variables set on top of the inherited environment
    pub env_overrides: Vec<(String, String)>,

    /// Install instructions for the unavailable-backend response
    pub install_hint: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::with_candidates(default_candidates())
    }
}

/// On-disk bridge configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BridgeConfigFile {
    /// Replacement launch table
    #[serde(default)]
    pub candidates: Vec<CandidateStrategy>,

    /// Extra environment for the backend
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl BridgeConfig {
    /// Build a config for the given launch table with platform defaults
    pub fn with_candidates(candidates: Vec<CandidateStrategy>) -> Self {
        Self {
            candidates,
            // Direct executable lookup misses .cmd/.bat shims on Windows
            use_shell: cfg!(windows),
            env_overrides: vec![(UNBUFFERED_ENV.0.to_string(), UNBUFFERED_ENV.1.to_string())],
            install_hint: INSTALL_HINT.to_string(),
        }
    }

    /// Load the session config, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!("No bridge config at {:?}, using defaults", path);
            return Self::default();
        }

        match read_config_from_path(&path) {
            Ok(file) => Self::default().apply(file),
            Err(e) => {
                tracing::warn!("Ignoring bridge config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Merge a config file over this config
    pub fn apply(mut self, file: BridgeConfigFile) -> Self {
        if !file.candidates.is_empty() {
            self.candidates = file.candidates;
        }

        for (key, value) in file.env {
            if key == UNBUFFERED_ENV.0 {
                tracing::warn!("Ignoring override of {} in bridge config", key);
                continue;
            }
            self.env_overrides.push((key, value));
        }

        self
    }
}

/// Resolve the config file location
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|dir| dir.join("google-automation-mcp").join("bridge.toml"))
}

/// Read configuration from a specific path
pub fn read_config_from_path(path: &Path) -> Result<BridgeConfigFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read bridge config: {}", e)))?;

    let file: BridgeConfigFile = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse bridge config: {}", e)))?;

    tracing::debug!(
        "Loaded bridge config with {} candidates and {} env overrides",
        file.candidates.len(),
        file.env.len()
    );

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.candidates, default_candidates());
        assert_eq!(config.use_shell, cfg!(windows));
        assert_eq!(
            config.env_overrides,
            vec![("PYTHONUNBUFFERED".to_string(), "1".to_string())]
        );
        assert_eq!(config.install_hint, INSTALL_HINT);
    }

    #[test]
    fn test_read_config_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[candidates]]
program = "nope"

[[candidates]]
program = "echo-server"
args = ["--stdio"]

[env]
ZETA = "last"
ALPHA = "first"
PYTHONUNBUFFERED = "0"
"#
        )
        .unwrap();

        let parsed = read_config_from_path(file.path()).unwrap();
        let config = BridgeConfig::default().apply(parsed);

        assert_eq!(
            config.candidates,
            vec![
                CandidateStrategy::new("nope", Vec::<String>::new()),
                CandidateStrategy::new("echo-server", ["--stdio"]),
            ]
        );
        assert_eq!(
            config.env_overrides,
            vec![
                ("PYTHONUNBUFFERED".to_string(), "1".to_string()),
                ("ALPHA".to_string(), "first".to_string()),
                ("ZETA".to_string(), "last".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_candidates_keep_defaults() {
        let config = BridgeConfig::default().apply(BridgeConfigFile::default());
        assert_eq!(config.candidates, default_candidates());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "candidates = 42").unwrap();

        let result = read_config_from_path(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
