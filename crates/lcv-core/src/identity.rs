//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers the engine keys caches and
//! policy lookups by. These prevent accidental identifier confusion —
//! you cannot pass a `WorkflowType` where a `BankId` is expected, and a
//! bank-wide cache invalidation cannot be keyed by the wrong string.

use serde::{Deserialize, Serialize};

use crate::error::LcvError;

/// Identifier of a bank (policy tenant).
///
/// Overlays, exceptions, and effective-ruleset cache entries are all
/// scoped per bank. Format: non-empty, no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankId(String);

/// Identifier of a workflow type (e.g. `"lc_issuance"`, `"doc_presentation"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowType(String);

impl BankId {
    /// Construct a validated bank identifier.
    ///
    /// # Errors
    ///
    /// Returns `LcvError::InvalidIdentifier` if the input is empty or
    /// contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, LcvError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(LcvError::InvalidIdentifier(format!(
                "bank id must be non-empty without whitespace, got {id:?}"
            )));
        }
        Ok(Self(id))
    }

    /// Access the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl WorkflowType {
    /// Construct a validated workflow type.
    ///
    /// # Errors
    ///
    /// Returns `LcvError::InvalidIdentifier` if the input is empty or
    /// contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, LcvError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(LcvError::InvalidIdentifier(format!(
                "workflow type must be non-empty without whitespace, got {id:?}"
            )));
        }
        Ok(Self(id))
    }

    /// Access the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BankId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bank:{}", self.0)
    }
}

impl std::fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_id_accepts_plain_ident() {
        let id = BankId::new("acme-trade-bank").unwrap();
        assert_eq!(id.as_str(), "acme-trade-bank");
        assert_eq!(id.to_string(), "bank:acme-trade-bank");
    }

    #[test]
    fn test_bank_id_rejects_empty_and_whitespace() {
        assert!(BankId::new("").is_err());
        assert!(BankId::new("acme bank").is_err());
        assert!(BankId::new("acme\tbank").is_err());
    }

    #[test]
    fn test_workflow_type_roundtrip() {
        let wt = WorkflowType::new("lc_issuance").unwrap();
        let json = serde_json::to_string(&wt).unwrap();
        assert_eq!(json, "\"lc_issuance\"");
        let parsed: WorkflowType = serde_json::from_str(&json).unwrap();
        assert_eq!(wt, parsed);
    }
}
