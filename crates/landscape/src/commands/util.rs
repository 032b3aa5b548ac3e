//! Shared helpers for command handlers: loading the landscape, reading
//! the envelope log, and replaying it through a session.

use std::path::Path;

use serde::Serialize;
use tabled::Tabled;
use tracing::{debug, info};

use landscape_config::{Config, ConfigError};
use landscape_core::{DispatchOutcome, Envelope, Landscape, LandscapeStructure, Session};

use crate::cli::{GlobalOpts, SessionArgs};
use crate::error::CliError;

/// One replayed envelope and what the dispatcher made of it.
#[derive(Debug, Clone, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct Replayed {
    #[tabled(rename = "Line")]
    pub line: usize,
    #[tabled(rename = "User")]
    pub user: String,
    #[tabled(rename = "Event")]
    pub event: &'static str,
    #[tabled(rename = "Outcome")]
    pub outcome: &'static str,
}

impl Replayed {
    pub fn is_rejected(&self) -> bool {
        self.outcome == <&str>::from(DispatchOutcome::Rejected)
    }
}

/// A session loaded from disk with its envelope log already applied.
pub struct LoadedSession {
    pub session: Session,
    pub replayed: Vec<Replayed>,
}

/// Load the landscape named by `args` (or the active profile), replay
/// the envelope log if one is given, and return the detached session.
pub async fn load_session(
    args: &SessionArgs,
    global: &GlobalOpts,
    skip_user: Option<&str>,
) -> Result<LoadedSession, CliError> {
    let cfg = landscape_config::load_config()?;
    let profile_name = global.profile.as_deref();
    let profile = cfg
        .profile(profile_name)
        .map_err(|err| profile_error(err, &cfg))?;
    let session_config = cfg.to_session_config(profile_name)?;

    let path = args
        .landscape
        .clone()
        .or(profile.landscape)
        .ok_or(CliError::NoLandscape)?;
    let structure = read_structure(&path)?;
    let session = Session::offline(session_config, Landscape::from_structure(&structure));
    info!(path = %path.display(), "landscape loaded");

    let mut replayed = Vec::new();
    if let Some(log) = &args.envelopes {
        let envelopes = read_envelopes(log)?;
        session.attach().await;
        for (line, envelope) in envelopes {
            if skip_user == Some(envelope.user_id.as_str()) {
                debug!(line, user = %envelope.user_id, "skipping own envelope");
                continue;
            }
            let outcome = session.deliver(&envelope).await;
            replayed.push(Replayed {
                line,
                user: envelope.user_id.clone(),
                event: envelope.original_message.event_name(),
                outcome: outcome.into(),
            });
        }
        session.detach().await;
        info!(envelopes = replayed.len(), "replay finished");
    }

    Ok(LoadedSession { session, replayed })
}

fn profile_error(err: ConfigError, cfg: &Config) -> CliError {
    match err {
        ConfigError::UnknownProfile { profile } => {
            let available = cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ");
            CliError::ProfileNotFound {
                name: profile,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available
                },
            }
        }
        other => other.into(),
    }
}

/// Read and parse a landscape structure document.
pub fn read_structure(path: &Path) -> Result<LandscapeStructure, CliError> {
    let contents = read(path)?;
    serde_json::from_str(&contents).map_err(|source| CliError::InvalidLandscape {
        path: path.display().to_string(),
        source,
    })
}

/// Read a JSONL envelope log. Blank lines are skipped; line numbers are
/// 1-based.
pub fn read_envelopes(path: &Path) -> Result<Vec<(usize, Envelope)>, CliError> {
    let contents = read(path)?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map(|envelope| (index + 1, envelope))
                .map_err(|source| CliError::InvalidEnvelope {
                    path: path.display().to_string(),
                    line: index + 1,
                    source,
                })
        })
        .collect()
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Unreadable {
        path: path.display().to_string(),
        source,
    })
}
