//! End-to-end engine flow over authored JSON rule content.

use serde_json::json;

use lcv_rules::{evaluate_rules, DocumentContext, Rule, Severity};

fn presentation_context() -> DocumentContext {
    DocumentContext::new(json!({
        "lc": {
            "amount": 100000,
            "currency": "USD",
            "expiry_date": "2026-04-01",
            "form": "irrevocable"
        },
        "invoice": {"amount": 105000, "currency": "USD"},
        "transport": {"shipment_date": "2026-03-06"},
        "presentation": {"date": "2026-03-16"},
        "documents": ["commercial_invoice", "bill_of_lading"]
    }))
}

fn presentation_rules() -> Vec<Rule> {
    serde_json::from_value(json!([
        {
            "id": "UCP600-18B",
            "title": "Invoice must not exceed credit amount",
            "severity": "critical",
            "conditions": [
                {"field": "invoice.amount", "operator": "less_than_or_equal",
                 "value_ref": "lc.amount"}
            ],
            "expected_outcome": {"invalid": ["invoice amount exceeds the credit"]}
        },
        {
            "id": "UCP600-14C",
            "title": "Presentation within 21 calendar days of shipment",
            "severity": "major",
            "conditions": [
                {"type": "time_constraint", "field": "presentation.date",
                 "reference": "transport.shipment_date", "days": 21}
            ]
        },
        {
            "id": "UCP600-18A",
            "title": "Invoice currency matches the credit",
            "conditions": [
                {"type": "consistency_check", "field": "invoice.currency",
                 "compare_to": "lc.currency"}
            ]
        },
        {
            "id": "LC-DOCSET-01",
            "title": "Transport document required",
            "conditions": [
                {"type": "doc_required", "document_type": "bill_of_lading"}
            ]
        },
        {
            "id": "LC-INS-01",
            "title": "Insurance certificate date present",
            "conditions": [
                {"field": "insurance.issue_date", "operator": "before",
                 "value_ref": "transport.shipment_date"}
            ]
        }
    ]))
    .unwrap()
}

#[test]
fn mixed_batch_produces_expected_summary() {
    let batch = evaluate_rules(&presentation_rules(), &presentation_context());

    assert_eq!(batch.rules_evaluated, 5);
    assert_eq!(batch.rules_failed, 1); // overdrawn invoice
    assert_eq!(batch.rules_passed, 3);
    assert_eq!(batch.rules_not_applicable, 1); // insurance data missing

    let overdrawn = &batch.outcomes[0];
    assert!(!overdrawn.passed);
    assert_eq!(overdrawn.severity, Severity::Critical);
    assert_eq!(overdrawn.message, "invoice amount exceeds the credit");

    let insurance = &batch.outcomes[4];
    assert!(insurance.not_applicable);
    assert_eq!(insurance.missing_fields, vec!["insurance.issue_date"]);

    assert_eq!(batch.violations.len(), 1);
    assert_eq!(batch.violations[0].rule_id, "UCP600-18B");
}

#[test]
fn corrected_invoice_clears_the_batch() {
    let mut rules = presentation_rules();
    rules.truncate(4); // drop the insurance rule
    let ctx = DocumentContext::new(json!({
        "lc": {"amount": 100000, "currency": "USD"},
        "invoice": {"amount": 95000, "currency": "USD"},
        "transport": {"shipment_date": "2026-03-06"},
        "presentation": {"date": "2026-03-16"},
        "documents": ["commercial_invoice", "bill_of_lading"]
    }));
    let batch = evaluate_rules(&rules, &ctx);
    assert_eq!(batch.rules_failed, 0);
    assert_eq!(batch.rules_passed, 4);
    assert!(batch.violations.is_empty());
}

#[test]
fn batch_from_yaml_authored_rules() {
    // Rule files are authored in YAML as often as JSON; the serde
    // shapes must accept both.
    let yaml = r#"
- id: LC-ENUM-01
  title: Credit form must be irrevocable
  conditions:
    - type: enum_value
      field: lc.form
      allowed: [irrevocable]
- id: LC-PRESENCE-01
  conditions:
    - type: field_presence
      field: lc.expiry_date
"#;
    let rules: Vec<Rule> = serde_yaml::from_str(yaml).unwrap();
    let batch = evaluate_rules(&rules, &presentation_context());
    assert_eq!(batch.rules_passed, 2);
}
