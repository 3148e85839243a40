//! Status enums and reroll aspects for ProxyForge.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for the representation stored inside JSON fields.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// DeckStatus
// ---------------------------------------------------------------------------

/// Publication state of a deck.
///
/// ```text
/// draft → published → archived
///       → archived
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeckStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl DeckStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for DeckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProxyStatus
// ---------------------------------------------------------------------------

/// Generation state of a single themed proxy card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProxyStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Error,
}

impl ProxyStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ProxyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RerollAspect
// ---------------------------------------------------------------------------

/// Part of a themed card that can be regenerated on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RerollAspect {
    Name,
    Flavor,
    Art,
}

impl RerollAspect {
    pub const ALL: [Self; 3] = [Self::Name, Self::Flavor, Self::Art];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Flavor => "flavor",
            Self::Art => "art",
        }
    }
}

impl fmt::Display for RerollAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RerollAspect {
    type Err = CoreError;

    /// Accepts the three aspect names; `all` is not an aspect, callers expand it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "flavor" => Ok(Self::Flavor),
            "art" => Ok(Self::Art),
            other => Err(CoreError::UnknownVariant {
                kind: "reroll aspect",
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MigrationStatus
// ---------------------------------------------------------------------------

/// Outcome recorded for a migration in `_migrations`.
///
/// ```text
/// pending → completed → reverted
///         → failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Completed,
    Failed,
    Reverted,
}

impl MigrationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Reverted => "reverted",
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
