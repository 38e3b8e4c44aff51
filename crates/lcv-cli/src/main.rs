//! # lcv CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// LCV — Letter-of-Credit compliance validation toolchain.
///
/// Evaluates LC document sets against authored compliance rules and
/// resolves the governing ICC ruleset domains.
#[derive(Parser, Debug)]
#[command(name = "lcv", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Evaluate a rule file against a document file.
    Validate(lcv_cli::validate::ValidateArgs),
    /// Resolve the governing ICC ruleset domains for a document.
    Domains(lcv_cli::domains::DomainsArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate(args) => {
            lcv_cli::validate::run(&args)?;
        }
        Commands::Domains(args) => {
            lcv_cli::domains::run(&args)?;
        }
    }

    Ok(())
}
