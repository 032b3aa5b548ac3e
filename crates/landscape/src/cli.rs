//! Clap derive structures for the `landscape` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// landscape -- replay and inspect collaborative landscape sessions
#[derive(Debug, Parser)]
#[command(
    name = "landscape",
    version,
    about = "Replay and inspect collaborative software-landscape sessions",
    long_about = "Loads a landscape structure document, feeds a log of collaboration\n\
        envelopes through the same dispatcher a live participant uses, and prints\n\
        the resulting tree and changelog.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "LANDSCAPE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LANDSCAPE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table or tree (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Feed an envelope log through the dispatcher and report each outcome
    Replay(ReplayArgs),

    /// Print the application/package/class tree
    #[command(alias = "t")]
    Tree(SessionArgs),

    /// Print the changelog
    #[command(alias = "log")]
    Changelog(ChangelogArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Session inputs ───────────────────────────────────────────────────

/// Landscape document plus an optional envelope log to replay over it.
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Landscape structure JSON (defaults to the profile's `landscape`)
    #[arg(long, short = 'l')]
    pub landscape: Option<PathBuf>,

    /// JSONL file of `{userId, originalMessage}` envelopes
    #[arg(long, short = 'e')]
    pub envelopes: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Fail if any envelope is rejected
    #[arg(long)]
    pub strict: bool,

    /// Envelopes from this user are treated as the local echo and skipped
    #[arg(long)]
    pub skip_user: Option<String>,
}

#[derive(Debug, Args)]
pub struct ChangelogArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Undo the last N entries after replaying
    #[arg(long, default_value = "0")]
    pub undo: usize,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a starter configuration file
    Init {
        /// Fixed participant id for the default profile
        #[arg(long)]
        user_id: Option<String>,

        /// Landscape file for the default profile
        #[arg(long)]
        landscape: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
