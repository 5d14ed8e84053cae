//! Configuration module for the ranking service.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `TR_` and use double underscores
//! to separate nested levels:
//! - `TR_MODELS_DIR=/data/models` sets `models_dir`
//! - `TR_LEARNER__REGULARIZATION=0.25` sets `learner.regularization`
//! - `TR_RANKING__PARALLEL_THREADS=8` sets `ranking.parallel_threads`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::metric::LearnerParams;

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".tagrank";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "TR_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Directory holding one sub-directory per collection
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Workspace root directory (where .tagrank is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Metric learner hyperparameters
    #[serde(default)]
    pub learner: LearnerConfig,

    /// Ranking execution settings
    #[serde(default)]
    pub ranking: RankingConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LearnerConfig {
    /// Step size of the online update
    #[serde(default = "default_regularization")]
    pub regularization: f64,

    /// Target squared distance for pairs marked similar
    #[serde(default = "default_target_same")]
    pub target_same: f64,

    /// Target squared distance for pairs marked dissimilar
    #[serde(default = "default_target_different")]
    pub target_different: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RankingConfig {
    /// Number of threads used to rank tags in parallel
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address
    #[serde(default = "default_bind_address")]
    pub bind: String,
}

// Default value functions
fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}
fn default_false() -> bool {
    false
}
fn default_regularization() -> f64 {
    0.5
}
fn default_target_same() -> f64 {
    7.0
}
fn default_target_different() -> f64 {
    10.0
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            workspace_root: None,
            debug: false,
            learner: LearnerConfig::default(),
            ranking: RankingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            regularization: default_regularization(),
            target_same: default_target_same(),
            target_different: default_target_different(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
        }
    }
}

impl LearnerConfig {
    /// Hyperparameters in the form the learner consumes.
    pub fn params(&self) -> LearnerParams {
        LearnerParams {
            regularization: self.regularization,
            target_same: self.target_same,
            target_different: self.target_different,
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .tagrank directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    ///
    /// Relative paths resolve against the directory holding `.tagrank`
    /// when the file lives there, otherwise against the file's directory.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let path = path.as_ref();
        Self::figment(path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::root_of_config(path);
                }
                settings
            })
    }

    fn root_of_config(path: &Path) -> Option<PathBuf> {
        let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty())?;
        match dir.file_name() {
            Some(name) if name == CONFIG_DIR => dir.parent().map(Path::to_path_buf),
            _ => Some(dir.to_path_buf()),
        }
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nesting, single underscore stays in field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by looking for .tagrank directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .tagrank is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Models directory resolved against the workspace root when relative
    pub fn resolved_models_dir(&self) -> PathBuf {
        match &self.workspace_root {
            Some(root) if self.models_dir.is_relative() => root.join(&self.models_dir),
            _ => self.models_dir.clone(),
        }
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(
        dir: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.as_ref().join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# tagrank configuration file

# Directory with one sub-directory per collection (relative to workspace root).
# Each collection holds params.json and doc_vectors.npz.
models_dir = "models"

# Global debug mode
debug = false

[learner]
# Online metric update step size
regularization = {regularization:?}

# Target squared distances for similar / dissimilar pairs
target_same = {target_same:?}
target_different = {target_different:?}

[ranking]
# Threads used to rank tags in parallel (defaults to CPU count)
# parallel_threads = {threads}

[server]
# HTTP bind address (requires the http-server feature)
bind = "{bind}"
"#,
            regularization = default_regularization(),
            target_same = default_target_same(),
            target_different = default_target_different(),
            threads = num_cpus::get(),
            bind = default_bind_address(),
        );

        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}
