//! Severity classification of a congestion index.

use serde::{Deserialize, Serialize};

use crate::config::SeverityThresholds;

/// Discrete congestion status, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Status {
    /// EDCI below the warning threshold.
    Normal,
    /// EDCI at or above the warning threshold and below the emergency threshold.
    Warning,
    /// EDCI at or above the emergency threshold.
    Emergency,
}

impl Status {
    /// Every variant, least severe first.
    pub const ALL: [Status; 3] = [Status::Normal, Status::Warning, Status::Emergency];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status name that is not one of `normal`, `warning` or `emergency`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status '{0}'. Must be one of: normal, warning, emergency")]
pub struct ParseStatusError(String);

impl std::str::FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "warning" => Ok(Self::Warning),
            "emergency" => Ok(Self::Emergency),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Classify an EDCI against the severity thresholds.
///
/// Boundaries belong to the more severe band: an EDCI equal to `warning` is `Warning` and one
/// equal to `emergency` is `Emergency`. Defined for every `f64`, including negative or
/// implausibly large values; `SeverityThresholds` cannot hold malformed cutoffs, so this never
/// fails.
pub fn classify(edci: f64, thresholds: &SeverityThresholds) -> Status {
    if edci >= thresholds.emergency() {
        Status::Emergency
    } else if edci >= thresholds.warning() {
        Status::Warning
    } else {
        Status::Normal
    }
}
