//! Registration policy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What `register` does when the user already has an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// Replace the existing entry; the most recent connection wins
    #[default]
    Upsert,
    /// Leave the existing entry untouched; the first connection wins even if
    /// it has since gone stale. Kept for parity with older deployments.
    KeepFirst,
}

impl RegistrationPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::KeepFirst => "keep_first",
        }
    }
}

impl fmt::Display for RegistrationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown registration policy: {0} (expected upsert or keep_first)")]
pub struct ParsePolicyError(String);

impl FromStr for RegistrationPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upsert" => Ok(Self::Upsert),
            "keep_first" | "keep-first" => Ok(Self::KeepFirst),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}
