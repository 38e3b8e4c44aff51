//! # lcv-cli — LCV Command-Line Interface
//!
//! Thin CLI over the engine crates for authoring-time checks and
//! operational spot validation.
//!
//! ## Subcommands
//!
//! - `validate` — evaluate a rule file (JSON or YAML) against a
//!   document file and print the batch result.
//! - `domains` — resolve the governing ICC ruleset domains for a
//!   document file.
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from handlers.
//! - Handler functions delegate to the engine crates — no business
//!   logic here.

pub mod domains;
pub mod validate;

use std::path::Path;

use anyhow::Context;

/// Load a JSON value from a `.json`, `.yaml`, or `.yml` file.
pub(crate) fn load_value(path: &Path) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))
    }
}
