//! Account address type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An account on the external token ledger.
///
/// The registry treats addresses as opaque identifiers: the ledger decides what a
/// well-formed address looks like, the core only compares and stores them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create a new address from a raw string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An address is usable when it is non-empty and contains no whitespace.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && !self.0.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity() {
        assert!(Address::new("alice").is_valid());
        assert!(!Address::new("").is_valid());
        assert!(!Address::new("al ice").is_valid());
    }

    #[test]
    fn display_is_raw() {
        assert_eq!(Address::from("registry").to_string(), "registry");
    }
}
