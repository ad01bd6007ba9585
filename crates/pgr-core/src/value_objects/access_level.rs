//! Access level granted to a user account

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Level of access a user has to premium features.
///
/// Stored as lowercase text in the database and serialized the same way in
/// API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Free,
    Premium,
}

impl AccessLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_premium(&self) -> bool {
        matches!(self, Self::Premium)
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored access level is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown access level: {0}")]
pub struct ParseAccessLevelError(pub String);

impl FromStr for AccessLevel {
    type Err = ParseAccessLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            other => Err(ParseAccessLevelError(other.to_string())),
        }
    }
}
