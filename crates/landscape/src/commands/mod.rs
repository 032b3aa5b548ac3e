//! Command dispatch: bridges CLI args -> session replay -> output formatting.

pub mod changelog;
pub mod config_cmd;
pub mod replay;
pub mod tree;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Replay(args) => replay::handle(args, global).await,
        Command::Tree(args) => tree::handle(args, global).await,
        Command::Changelog(args) => changelog::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = crate::cli::Cli::command();
            generate(args.shell, &mut cmd, "landscape", &mut std::io::stdout());
            Ok(())
        }
    }
}
