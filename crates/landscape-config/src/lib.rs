//! Shared configuration for landscape collaboration tools.
//!
//! TOML profiles layered over built-in defaults and `LANDSCAPE_`
//! environment variables, and translation to
//! `landscape_core::SessionConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use landscape_core::SessionConfig;
use landscape_core::config::DEFAULT_OFFLINE_USER_ID;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named participant profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default = "default_offline_user_id")]
    pub offline_user_id: String,

    /// Seconds to wait for a server-assigned id.
    #[serde(default = "default_id_timeout")]
    pub id_request_timeout: u64,

    #[serde(default = "default_capacity")]
    pub bus_capacity: usize,

    #[serde(default = "default_capacity")]
    pub event_capacity: usize,

    #[serde(default = "default_max_redo_stashes")]
    pub max_redo_stashes: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            log_format: default_log_format(),
            offline_user_id: default_offline_user_id(),
            id_request_timeout: default_id_timeout(),
            bus_capacity: default_capacity(),
            event_capacity: default_capacity(),
            max_redo_stashes: default_max_redo_stashes(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_offline_user_id() -> String {
    DEFAULT_OFFLINE_USER_ID.into()
}
fn default_id_timeout() -> u64 {
    5
}
fn default_capacity() -> usize {
    256
}
fn default_max_redo_stashes() -> usize {
    landscape_core::changelog::DEFAULT_MAX_STASHES
}

/// A named participant profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Participant id, when it is fixed rather than server-assigned.
    pub user_id: Option<String>,

    /// Landscape structure file loaded when none is given on the
    /// command line.
    pub landscape: Option<PathBuf>,

    /// Override the redo stash limit.
    pub max_redo_stashes: Option<usize>,

    /// Override the id request timeout (seconds).
    pub id_request_timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "landscape", "landscape").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("landscape");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Nested keys use a double underscore, e.g.
/// `LANDSCAPE_DEFAULTS__LOG_FORMAT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LANDSCAPE_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.defaults.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::Validation {
                field: "defaults.log_format".into(),
                reason: format!("expected 'text' or 'json', got '{}'", self.defaults.log_format),
            });
        }
        if self.defaults.offline_user_id.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "defaults.offline_user_id".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// The named profile, or the default one. A missing default profile
    /// yields an empty profile; a missing named one is an error.
    pub fn profile(&self, name: Option<&str>) -> Result<Profile, ConfigError> {
        match name {
            Some(name) => self
                .profiles
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownProfile {
                    profile: name.into(),
                }),
            None => Ok(self
                .default_profile
                .as_ref()
                .and_then(|name| self.profiles.get(name))
                .cloned()
                .unwrap_or_default()),
        }
    }

    /// Build a `SessionConfig` for `profile_name` (or the default profile).
    pub fn to_session_config(
        &self,
        profile_name: Option<&str>,
    ) -> Result<SessionConfig, ConfigError> {
        let profile = self.profile(profile_name)?;
        let d = &self.defaults;
        Ok(SessionConfig {
            user_id: profile.user_id,
            offline_user_id: d.offline_user_id.clone(),
            bus_capacity: d.bus_capacity.max(1),
            event_capacity: d.event_capacity.max(1),
            id_request_timeout: Duration::from_secs(
                profile.id_request_timeout.unwrap_or(d.id_request_timeout),
            ),
            max_redo_stashes: profile.max_redo_stashes.unwrap_or(d.max_redo_stashes),
        })
    }
}
