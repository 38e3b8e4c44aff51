//! # Domains Subcommand
//!
//! Resolves the governing ICC ruleset domains for a document file.

use std::path::PathBuf;

use clap::Args;

use lcv_rules::DocumentContext;
use lcv_rulesets::{resolve_ruleset_domains, DomainResolution};

/// Arguments for the domains subcommand.
#[derive(Args, Debug)]
pub struct DomainsArgs {
    /// Document data file (JSON or YAML).
    #[arg(long)]
    pub document: PathBuf,
}

/// Run the domains subcommand.
pub fn run(args: &DomainsArgs) -> anyhow::Result<DomainResolution> {
    let context = DocumentContext::new(crate::load_value(&args.document)?);
    let resolution = resolve_ruleset_domains(&context);
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(resolution)
}
