//! # Validate Subcommand
//!
//! Evaluates a rule file against a document file and prints the batch
//! result as JSON (default) or a human-readable summary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use lcv_rules::{evaluate_rules, BatchResult, DocumentContext, Rule};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Rule file (JSON or YAML) holding a list of rules.
    #[arg(long)]
    pub rules: PathBuf,

    /// Document data file (JSON or YAML).
    #[arg(long)]
    pub document: PathBuf,

    /// Print a human-readable summary instead of JSON.
    #[arg(long)]
    pub summary: bool,
}

/// Run the validate subcommand.
///
/// Exit behavior: returns an error only for unreadable input files —
/// failed rules are an ordinary result, reported in the output.
pub fn run(args: &ValidateArgs) -> anyhow::Result<BatchResult> {
    let rules: Vec<Rule> = serde_json::from_value(crate::load_value(&args.rules)?)
        .with_context(|| format!("rule file {} has an invalid shape", args.rules.display()))?;
    let context = DocumentContext::new(crate::load_value(&args.document)?);

    tracing::info!(
        rules = rules.len(),
        document = %args.document.display(),
        "evaluating rule batch"
    );
    let batch = evaluate_rules(&rules, &context);

    if args.summary {
        print_summary(&batch);
    } else {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    }
    Ok(batch)
}

fn print_summary(batch: &BatchResult) {
    println!(
        "{} evaluated: {} passed, {} failed, {} not applicable",
        batch.rules_evaluated, batch.rules_passed, batch.rules_failed, batch.rules_not_applicable
    );
    for outcome in &batch.outcomes {
        if !outcome.passed && !outcome.not_applicable {
            println!("  [{}] {}: {}", outcome.severity, outcome.rule_id, outcome.message);
            for violation in &outcome.violations {
                println!("      - {}", violation.condition);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_validate_json_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let rules = write_file(
            &dir,
            "rules.json",
            r#"[{"id": "R-1", "conditions": [
                {"field": "invoice.amount", "operator": "less_than_or_equal",
                 "value_ref": "lc.amount"}]}]"#,
        );
        let document = write_file(
            &dir,
            "doc.json",
            r#"{"invoice": {"amount": 105000}, "lc": {"amount": 100000}}"#,
        );
        let batch = run(&ValidateArgs {
            rules,
            document,
            summary: false,
        })
        .unwrap();
        assert_eq!(batch.rules_failed, 1);
    }

    #[test]
    fn test_validate_yaml_rules() {
        let dir = tempfile::tempdir().unwrap();
        let rules = write_file(
            &dir,
            "rules.yaml",
            "- id: R-1\n  conditions:\n    - type: field_presence\n      field: lc.amount\n",
        );
        let document = write_file(&dir, "doc.json", r#"{"lc": {"amount": 1}}"#);
        let batch = run(&ValidateArgs {
            rules,
            document,
            summary: true,
        })
        .unwrap();
        assert_eq!(batch.rules_passed, 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let document = write_file(&dir, "doc.json", "{}");
        let result = run(&ValidateArgs {
            rules: dir.path().join("absent.json"),
            document,
            summary: false,
        });
        assert!(result.is_err());
    }
}
