//! Security identifiers and static attributes.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Stable security code, e.g. `"2330"`.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    From,
)]
#[serde(transparent)]
pub struct SecurityCode(String);

impl SecurityCode {
    /// Create a security code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SecurityCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Static attributes of a listed security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    /// Security code
    pub code: SecurityCode,
    /// Display name
    pub name: String,
    /// Sector or industry group
    pub group: String,
}

impl Security {
    /// Create a new security.
    pub fn new(
        code: impl Into<SecurityCode>,
        name: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            group: group.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_ordering_and_display() {
        let a = SecurityCode::from("1101");
        let b = SecurityCode::from("2330");
        assert!(a < b);
        assert_eq!(b.to_string(), "2330");
        assert_eq!(SecurityCode::default().as_str(), "");
    }
}
