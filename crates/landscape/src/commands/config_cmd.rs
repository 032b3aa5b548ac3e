//! Config subcommand handlers.

use std::path::PathBuf;

use landscape_config::{self as config, Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter};

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            output::print_output(toml::to_string_pretty(&cfg)?.trim_end(), global.quiet);
            Ok(())
        }
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::Init {
            user_id,
            landscape,
            force,
        } => init(user_id, landscape, force, global),
    }
}

fn init(
    user_id: Option<String>,
    landscape: Option<PathBuf>,
    force: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let path = config::config_path();
    if path.exists() && !force {
        return Err(CliError::ConfigExists {
            path: path.display().to_string(),
        });
    }

    let mut cfg = Config::default();
    let profile_name = global.profile.clone().unwrap_or_else(|| "default".into());
    cfg.default_profile = Some(profile_name.clone());
    cfg.profiles.insert(
        profile_name,
        Profile {
            user_id,
            landscape,
            ..Profile::default()
        },
    );

    let written = config::save_config(&cfg)?;
    if !global.quiet {
        let painter = Painter::new(global.color);
        eprintln!("{} {}", painter.good("wrote"), written.display());
    }
    Ok(())
}
