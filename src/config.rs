use crate::error::{MatchError, Result};
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunmatchConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Connection settings for the hosted store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: String,
    /// Public (anon) key sent as the `apikey` header.
    #[serde(default)]
    pub api_key: String,
    /// Session token for row-level security; falls back to `api_key`.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Recompute the stored vector after sign-up, profile edits and run changes.
    #[serde(default = "default_true")]
    pub refresh_on_events: bool,
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            access_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            refresh_on_events: true,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(MatchError::Configuration("store.url is not set".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(MatchError::Configuration("store.api_key is not set".to_string()));
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("RUNMATCH")
        .separator("__")
        .try_parsing(true)
}

pub struct ConfigManager {
    config: RunmatchConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_path_internal()?;
        Self::from_path(config_path)
    }

    /// Config file contents only, without `RUNMATCH__*` overrides. Use this
    /// when the result will be saved back, so env-supplied secrets stay out
    /// of the file.
    pub fn for_editing() -> Result<Self> {
        let config_path = Self::get_config_path_internal()?;
        Self::file_only(config_path)
    }

    pub fn from_path(config_path: PathBuf) -> Result<Self> {
        Self::with_env(config_path, Some(env_source()))
    }

    pub fn file_only(config_path: PathBuf) -> Result<Self> {
        Self::with_env(config_path, None)
    }

    fn with_env(config_path: PathBuf, env: Option<Environment>) -> Result<Self> {
        let config = Self::load_or_default(&config_path, env)?;

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn save(&self) -> Result<()> {
        let toml = toml::to_string_pretty(&self.config).map_err(|e| {
            MatchError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.config_path, toml)
            .map_err(|e| MatchError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> &RunmatchConfig {
        &self.config
    }

    pub fn get_mut(&mut self) -> &mut RunmatchConfig {
        &mut self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn get_config_path_internal() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "runmatch", "runmatch").ok_or_else(|| {
            MatchError::Configuration("Could not determine config directory".to_string())
        })?;

        let config_dir = project_dirs.config_dir();
        fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    fn load_or_default(path: &Path, env: Option<Environment>) -> Result<RunmatchConfig> {
        let mut builder = Config::builder();
        if path.exists() {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }
        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        let s = builder
            .build()
            .map_err(|e| MatchError::Configuration(format!("Failed to build config: {}", e)))?;

        let config: RunmatchConfig = s.try_deserialize().map_err(|e| {
            MatchError::Configuration(format!("Failed to deserialize config: {}", e))
        })?;

        Ok(config)
    }
}
