//! Per-address ownership outcome.

use serde::Serialize;

/// Result of checking a single input entry.
///
/// `address` holds the entry exactly as it appeared in the input (trimmed),
/// so every output row can be traced back to an input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnershipResult {
    pub address: String,
    #[serde(rename = "owns_nft")]
    pub owns_token: bool,
    pub error: Option<String>,
}

impl OwnershipResult {
    pub fn owned(address: impl Into<String>, owns_token: bool) -> Self {
        Self {
            address: address.into(),
            owns_token,
            error: None,
        }
    }

    /// A failed check. `owns_token` is always false.
    pub fn failed(address: impl Into<String>, error: impl ToString) -> Self {
        Self {
            address: address.into(),
            owns_token: false,
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_never_owns() {
        let r = OwnershipResult::failed("0xabc", "boom");
        assert!(!r.owns_token);
        assert!(r.is_error());
        assert_eq!(r.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_serializes_with_csv_column_names() {
        let r = OwnershipResult::owned("0xabc", true);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["owns_nft"], true);
        assert!(json["error"].is_null());
    }
}
