//! Dockyard CLI - a build orchestrator for modular Java projects

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dockyard::builder::{PlanError, ToolExecutionError};
use dockyard::resolver::ResolutionError;
use dockyard::scanner::{LayoutError, ParseError};
use dockyard::util::diagnostic::{emit, suggestions, Diagnostic};
use dockyard::util::GlobalContext;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        match diagnostic_of(&e) {
            Some(diag) => emit(&diag, color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("dockyard=debug")
    } else {
        EnvFilter::new("dockyard=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);
    ctx.set_color(color);

    // Execute command
    match cli.command {
        Commands::Scan => commands::scan::execute(&ctx),
        Commands::Resolve(args) => commands::resolve::execute(&ctx, args),
        Commands::Plan(args) => commands::plan::execute(&ctx, args),
        Commands::Build(args) => commands::build::execute(&ctx, args),
        Commands::Tree => commands::tree::execute(&ctx),
        Commands::Grab(args) => commands::grab::execute(&ctx, args),
        Commands::Clean => commands::clean::execute(&ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Find a failure with a dedicated diagnostic in the error chain.
fn diagnostic_of(err: &anyhow::Error) -> Option<Diagnostic> {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ResolutionError>() {
            return Some(e.to_diagnostic());
        }
        if let Some(PlanError::Resolution(e)) = cause.downcast_ref::<PlanError>() {
            return Some(e.to_diagnostic());
        }
        if let Some(e) = cause.downcast_ref::<ToolExecutionError>() {
            return Some(e.to_diagnostic());
        }
        if let Some(e) = cause.downcast_ref::<ParseError>() {
            let diag = Diagnostic::error(e.to_string());
            return Some(match e {
                ParseError::MissingHeader { path: Some(path) } | ParseError::Io { path, .. } => {
                    diag.with_location(path)
                }
                ParseError::MissingHeader { path: None } => diag,
            });
        }
        if let Some(e @ LayoutError::NoModules { .. }) = cause.downcast_ref::<LayoutError>() {
            return Some(Diagnostic::error(e.to_string()).with_suggestion(suggestions::NO_MODULES));
        }
    }
    None
}
