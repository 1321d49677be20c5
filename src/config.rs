//! Configuration for storycheck
//!
//! Hierarchy, highest priority first:
//! 1. Environment variables (`GEMINI_API_KEY`, `STORYCHECK_*`)
//! 2. User config (`~/.config/storycheck/config.toml`)
//! 3. Built-in defaults
//!
//! A `.env` file is loaded by the binary at startup, so the API key can
//! live next to the project instead of the shell profile.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StorycheckError, StorycheckResult};

/// Default generation model
fn default_model() -> String {
    "gemini-2.5-pro".to_string()
}

/// Default API endpoint
fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

/// Default sampling temperature; low, so reviews are reproducible
fn default_temperature() -> f32 {
    0.3
}

/// Remote store per-file cap (2 GiB)
fn default_max_archive_bytes() -> u64 {
    2 * 1024 * 1024 * 1024
}

/// Text documents land in the prompt verbatim, so keep them small (1 MiB)
fn default_max_document_bytes() -> u64 {
    1024 * 1024
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API key for the generation service; usually from the environment
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model invoked for reviews
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the generation service
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Sampling temperature for the generation call
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum size accepted for a source archive
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,

    /// Maximum size accepted for story/criteria/template documents
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_base: default_api_base(),
            temperature: default_temperature(),
            max_archive_bytes: default_max_archive_bytes(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

/// Non-fatal configuration warning surfaced to CLI users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
}

impl Config {
    /// Load from a TOML file, collecting unknown-key warnings
    pub fn load(path: &Path) -> StorycheckResult<(Self, Vec<ConfigWarning>)> {
        let content = fs::read_to_string(path)?;

        let mut unknown_keys: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);
        let config: Config = serde_ignored::deserialize(deserializer, |p| {
            unknown_keys.push(p.to_string());
        })
        .map_err(|e| StorycheckError::Config {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let warnings = unknown_keys
            .into_iter()
            .map(|key| ConfigWarning {
                key,
                file: path.to_path_buf(),
            })
            .collect();

        Ok((config, warnings))
    }

    /// Load the user config if present, then apply environment overrides
    pub fn load_or_default() -> (Self, Vec<ConfigWarning>) {
        let mut warnings = Vec::new();
        let mut config = Config::default();

        if let Some(path) = user_config_path() {
            if path.exists() {
                if let Ok((loaded, mut file_warnings)) = Config::load(&path) {
                    config = loaded;
                    warnings.append(&mut file_warnings);
                }
            }
        }

        (config.with_env_overrides(), warnings)
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("STORYCHECK_MODEL") {
            if !model.trim().is_empty() {
                self.model = model;
            }
        }
        if let Ok(base) = std::env::var("STORYCHECK_API_BASE") {
            if !base.trim().is_empty() {
                self.api_base = base;
            }
        }
        self
    }

    /// The API key, or `ApiKeyMissing`
    pub fn require_api_key(&self) -> StorycheckResult<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(StorycheckError::ApiKeyMissing)
    }
}

/// Path of the user-level config file
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("storycheck/config.toml"))
}
