//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use landscape_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Inputs ───────────────────────────────────────────────────────
    #[error("No landscape file given")]
    #[diagnostic(
        code(landscape::no_landscape),
        help(
            "Pass one with --landscape <FILE>, or set `landscape` in your profile:\n\
             landscape config init --landscape <FILE>"
        )
    )]
    NoLandscape,

    #[error("Could not read {path}")]
    #[diagnostic(code(landscape::unreadable), help("Check that the file exists and is readable."))]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a landscape structure document")]
    #[diagnostic(
        code(landscape::invalid_landscape),
        help("Expected JSON with `landscapeToken`, `nodes` and `communications`.")
    )]
    InvalidLandscape {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line {line} of {path} is not a valid envelope")]
    #[diagnostic(
        code(landscape::invalid_envelope),
        help("Each line must be a JSON object with `userId` and `originalMessage`.")
    )]
    InvalidEnvelope {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    // ── Replay ───────────────────────────────────────────────────────
    #[error("{count} envelope(s) were rejected")]
    #[diagnostic(
        code(landscape::rejected),
        help("Re-run with -v to see why each one was rejected, or drop --strict.")
    )]
    Rejected { count: usize },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(landscape::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: landscape config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(code(landscape::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(landscape::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not encode output: {0}")]
    #[diagnostic(code(landscape::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not encode configuration: {0}")]
    #[diagnostic(code(landscape::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoLandscape
            | Self::InvalidLandscape { .. }
            | Self::InvalidEnvelope { .. }
            | Self::ConfigExists { .. } => exit_code::USAGE,
            Self::Unreadable { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::CONFLICT,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
