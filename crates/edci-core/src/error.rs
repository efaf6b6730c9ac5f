use std::fmt;

/// Ratio the calculator failed to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ratio {
    /// Physician pressure ratio (`adjustedPBR`).
    AdjustedPbr,
    /// Nurse pressure ratio (`NBR`).
    Nbr,
}

impl Ratio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdjustedPbr => "adjustedPBR",
            Self::Nbr => "NBR",
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reading that violates a structural invariant.
///
/// Every variant carries the facility id as supplied by the provider (possibly blank when the id
/// itself is the problem) and the offending field, so callers can log and exclude the facility
/// without touching the rest of the cycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataIntegrityError {
    #[error("facility {facility_id:?}: invalid {field}: {reason}")]
    InvalidIdentity {
        facility_id: String,
        field: &'static str,
        reason: edci_types::TextError,
    },
    #[error("facility {facility_id}: {field} must not be negative (got {value})")]
    NegativeCount {
        facility_id: String,
        field: &'static str,
        value: i64,
    },
    #[error("facility {facility_id}: {field} exceeds the supported range (got {value})")]
    CountOutOfRange {
        facility_id: String,
        field: &'static str,
        value: i64,
    },
    #[error("facility {facility_id}: {field} must not be negative (got {value})")]
    NegativeValue {
        facility_id: String,
        field: &'static str,
        value: f64,
    },
    #[error("facility {facility_id}: {field} must be a finite number")]
    NonFinite {
        facility_id: String,
        field: &'static str,
    },
    #[error(
        "facility {facility_id}: totalPatients is {reported} but triage levels sum to {computed}"
    )]
    InconsistentTotal {
        facility_id: String,
        reported: i64,
        computed: u64,
    },
    #[error("facility {facility_id}: cannot compute {ratio}, {field} must be positive (got {value})")]
    NonPositiveDenominator {
        facility_id: String,
        ratio: Ratio,
        field: &'static str,
        value: f64,
    },
    #[error("facility {facility_id}: {metric} is not a finite number (inputs overflow)")]
    NonFiniteMetric {
        facility_id: String,
        metric: &'static str,
    },
}

impl DataIntegrityError {
    /// Facility id as supplied by the provider.
    pub fn facility_id(&self) -> &str {
        match self {
            Self::InvalidIdentity { facility_id, .. }
            | Self::NegativeCount { facility_id, .. }
            | Self::CountOutOfRange { facility_id, .. }
            | Self::NegativeValue { facility_id, .. }
            | Self::NonFinite { facility_id, .. }
            | Self::InconsistentTotal { facility_id, .. }
            | Self::NonPositiveDenominator { facility_id, .. }
            | Self::NonFiniteMetric { facility_id, .. } => facility_id,
        }
    }

    /// Name of the offending input field, using the feed's field names.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidIdentity { field, .. }
            | Self::NegativeCount { field, .. }
            | Self::CountOutOfRange { field, .. }
            | Self::NegativeValue { field, .. }
            | Self::NonFinite { field, .. }
            | Self::NonPositiveDenominator { field, .. } => field,
            Self::NonFiniteMetric { metric, .. } => metric,
            Self::InconsistentTotal { .. } => "totalPatients",
        }
    }
}

/// Malformed engine configuration. Raised while loading configuration, never per cycle.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("severity thresholds must satisfy warning < emergency (got warning={warning}, emergency={emergency})")]
    InvertedSeverityThresholds { warning: f64, emergency: f64 },
    #[error("{name} must be a finite number")]
    NonFinite { name: &'static str },
    #[error("{name} must not be negative (got {value})")]
    NegativeValue { name: &'static str, value: f64 },
    #[error("failed to read configuration file: {0}")]
    FileRead(std::io::Error),
    #[error("configuration schema mismatch at {path}: {message}")]
    Schema { path: String, message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
