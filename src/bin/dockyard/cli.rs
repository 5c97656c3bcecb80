//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Dockyard - a build orchestrator for modular Java projects
#[derive(Parser)]
#[command(name = "dockyard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show spaces, module units and missing modules
    Scan,

    /// Download missing external modules into the library directory
    Resolve(ResolveArgs),

    /// Print the tool invocations of a build without running them
    Plan(PlanArgs),

    /// Resolve, compile, document, package and link all spaces
    Build(BuildArgs),

    /// Display the requires tree of each space
    Tree,

    /// Fetch the assets listed in a grab file
    Grab(GrabArgs),

    /// Remove build outputs
    Clean,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Only use links to local files
    #[arg(long, env = "DOCKYARD_OFFLINE")]
    pub offline: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Emit the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormatArg {
    Human,
    Json,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Run every task that does not depend on a failed space
    #[arg(long)]
    pub no_fail_fast: bool,

    /// Only use links to local files
    #[arg(long, env = "DOCKYARD_OFFLINE")]
    pub offline: bool,

    /// Output format of build messages
    #[arg(long, value_enum, default_value = "human")]
    pub message_format: MessageFormatArg,
}

#[derive(Args)]
pub struct GrabArgs {
    /// Grab file to process
    pub file: PathBuf,

    /// Only write string entries and present files
    #[arg(long, env = "DOCKYARD_OFFLINE")]
    pub offline: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
