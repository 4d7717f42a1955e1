//! Endpoint profile configuration.
//!
//! Profiles name pre-configured endpoints so callers can construct a client
//! without hard-coding addresses. Files are json5, discovered in the current
//! directory's `.procgate/` and then the user config directory.

use crate::transport::Binding;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config filename.
const DEFAULT_CONFIG_FILE: &str = "procgate.json5";
/// Default config directory under the working directory.
const DEFAULT_CONFIG_DIR: &str = ".procgate";

/// Errors returned while loading profiles or resolving one by name.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing a config file failed.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// No config file exists in any discovery location.
    #[error("no {DEFAULT_CONFIG_FILE} found")]
    NotFound,
    /// The requested profile is not defined.
    #[error("unknown endpoint profile: {0}")]
    UnknownProfile(String),
    /// The profile exists but cannot produce a usable endpoint.
    #[error("invalid profile {name}: {message}")]
    InvalidProfile { name: String, message: String },
}

/// Root config: named endpoint profiles.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    /// Profiles keyed by name.
    #[serde(default)]
    pub endpoints: HashMap<String, EndpointProfile>,
}

/// One pre-configured endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EndpointProfile {
    /// Remote address; optional because a caller may supply one explicitly.
    #[serde(default)]
    pub address: Option<String>,
    /// Whole-call timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// User-Agent override.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Load config from an explicit path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("loading config from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Ok(json5::from_str(&raw)?)
    }

    /// Load config from the default discovery locations: the working
    /// directory's `.procgate/procgate.json5`, then the user config dir.
    pub fn load_default() -> Result<Self, ConfigError> {
        for candidate in discovery_paths() {
            if candidate.is_file() {
                return Self::load(candidate);
            }
        }
        Err(ConfigError::NotFound)
    }

    /// Resolve a profile by name.
    pub fn profile(&self, name: &str) -> Result<&EndpointProfile, ConfigError> {
        self.endpoints
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }
}

impl EndpointProfile {
    /// Transport binding derived from this profile, with defaults filled in.
    pub fn binding(&self) -> Binding {
        let defaults = Binding::default();
        Binding {
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

fn discovery_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE));
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "procgate") {
        paths.push(dirs.config_dir().join(DEFAULT_CONFIG_FILE));
    }
    paths
}
