//! Engine configuration.
//!
//! Configuration is resolved and validated once at process startup and then passed into the
//! engine explicitly. Nothing in the engine reads environment variables or global defaults while
//! a cycle is being evaluated, so operators can retune thresholds by editing the configuration
//! file and restarting the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ADMISSION_BACKLOG_LIMIT, DEFAULT_EMERGENCY_EDCI, DEFAULT_NURSE_PRESSURE_LIMIT,
    DEFAULT_PHYSICIAN_PRESSURE_LIMIT, DEFAULT_PROLONGED_STAY_LIMIT, DEFAULT_TRANSFER_HOURS_LIMIT,
    DEFAULT_WARNING_EDCI, DEFAULT_WEIGHT_ADMISSION_BACKLOG, DEFAULT_WEIGHT_NURSE_PRESSURE,
    DEFAULT_WEIGHT_PHYSICIAN_PRESSURE, DEFAULT_WEIGHT_PROLONGED_STAY,
    DEFAULT_WEIGHT_TRANSFER_HOURS,
};
use crate::error::{ConfigError, ConfigResult};

/// EDCI cutoffs separating `normal`, `warning` and `emergency`.
///
/// Construction guarantees both values are finite and `warning < emergency`, so classification
/// against a `SeverityThresholds` can never meet an ambiguous band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeverityThresholds {
    warning: f64,
    emergency: f64,
}

impl SeverityThresholds {
    /// # Errors
    ///
    /// Returns [`ConfigError::NonFinite`] if either value is NaN or infinite, and
    /// [`ConfigError::InvertedSeverityThresholds`] if `warning >= emergency`. The values are
    /// never swapped or clamped.
    pub fn new(warning: f64, emergency: f64) -> ConfigResult<Self> {
        if !warning.is_finite() {
            return Err(ConfigError::NonFinite {
                name: "severity.warning",
            });
        }
        if !emergency.is_finite() {
            return Err(ConfigError::NonFinite {
                name: "severity.emergency",
            });
        }
        if warning >= emergency {
            return Err(ConfigError::InvertedSeverityThresholds { warning, emergency });
        }
        Ok(Self { warning, emergency })
    }

    pub fn warning(&self) -> f64 {
        self.warning
    }

    pub fn emergency(&self) -> f64 {
        self.emergency
    }
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            warning: DEFAULT_WARNING_EDCI,
            emergency: DEFAULT_EMERGENCY_EDCI,
        }
    }
}

/// Per-metric limits for alert-reason derivation. A reason fires when the metric strictly
/// exceeds its limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertLimits {
    pub physician_pressure: f64,
    pub nurse_pressure: f64,
    pub admission_backlog: u32,
    pub prolonged_stay: u32,
    pub transfer_hours: f64,
}

impl AlertLimits {
    fn validate(&self) -> ConfigResult<()> {
        check_non_negative("alert_limits.physician_pressure", self.physician_pressure)?;
        check_non_negative("alert_limits.nurse_pressure", self.nurse_pressure)?;
        check_non_negative("alert_limits.transfer_hours", self.transfer_hours)
    }
}

impl Default for AlertLimits {
    fn default() -> Self {
        Self {
            physician_pressure: DEFAULT_PHYSICIAN_PRESSURE_LIMIT,
            nurse_pressure: DEFAULT_NURSE_PRESSURE_LIMIT,
            admission_backlog: DEFAULT_ADMISSION_BACKLOG_LIMIT,
            prolonged_stay: DEFAULT_PROLONGED_STAY_LIMIT,
            transfer_hours: DEFAULT_TRANSFER_HOURS_LIMIT,
        }
    }
}

/// Weights of the composite EDCI used when a reading does not carry its own index.
///
/// Weights are non-negative, which keeps the composite monotone in every input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdciWeights {
    pub physician_pressure: f64,
    pub nurse_pressure: f64,
    pub admission_backlog: f64,
    pub prolonged_stay: f64,
    pub transfer_hours: f64,
}

impl EdciWeights {
    fn validate(&self) -> ConfigResult<()> {
        check_non_negative("edci_weights.physician_pressure", self.physician_pressure)?;
        check_non_negative("edci_weights.nurse_pressure", self.nurse_pressure)?;
        check_non_negative("edci_weights.admission_backlog", self.admission_backlog)?;
        check_non_negative("edci_weights.prolonged_stay", self.prolonged_stay)?;
        check_non_negative("edci_weights.transfer_hours", self.transfer_hours)
    }
}

impl Default for EdciWeights {
    fn default() -> Self {
        Self {
            physician_pressure: DEFAULT_WEIGHT_PHYSICIAN_PRESSURE,
            nurse_pressure: DEFAULT_WEIGHT_NURSE_PRESSURE,
            admission_backlog: DEFAULT_WEIGHT_ADMISSION_BACKLOG,
            prolonged_stay: DEFAULT_WEIGHT_PROLONGED_STAY,
            transfer_hours: DEFAULT_WEIGHT_TRANSFER_HOURS,
        }
    }
}

fn check_non_negative(name: &'static str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { name });
    }
    if value < 0.0 {
        return Err(ConfigError::NegativeValue { name, value });
    }
    Ok(())
}

/// Validated engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineConfig {
    severity: SeverityThresholds,
    alert_limits: AlertLimits,
    edci_weights: EdciWeights,
}

impl EngineConfig {
    /// Create a new `EngineConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any limit or weight is negative or non-finite.
    pub fn new(
        severity: SeverityThresholds,
        alert_limits: AlertLimits,
        edci_weights: EdciWeights,
    ) -> ConfigResult<Self> {
        alert_limits.validate()?;
        edci_weights.validate()?;
        Ok(Self {
            severity,
            alert_limits,
            edci_weights,
        })
    }

    /// Parse configuration from YAML text.
    ///
    /// Every section and every key is optional and falls back to the defaults in
    /// [`crate::constants`]. Unknown keys are rejected, and schema errors report the path of the
    /// failing key (e.g. `alert_limits.nurse_pressure`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Schema`] if the YAML does not match the configuration schema, or
    /// any validation error from [`EngineConfig::new`] / [`SeverityThresholds::new`].
    pub fn from_yaml_str(yaml_text: &str) -> ConfigResult<Self> {
        if yaml_text.trim().is_empty() {
            return Ok(Self::default());
        }

        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire = match serde_path_to_error::deserialize::<_, EngineConfigWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                return Err(ConfigError::Schema {
                    path,
                    message: source.to_string(),
                });
            }
        };

        let severity = SeverityThresholds::new(wire.severity.warning, wire.severity.emergency)?;
        Self::new(severity, wire.alert_limits, wire.edci_weights)
    }

    /// Read and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be read, otherwise the errors of
    /// [`EngineConfig::from_yaml_str`].
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::FileRead)?;
        let cfg = Self::from_yaml_str(&text)?;
        tracing::debug!("loaded engine configuration from {}", path.display());
        Ok(cfg)
    }

    pub fn severity(&self) -> &SeverityThresholds {
        &self.severity
    }

    pub fn alert_limits(&self) -> &AlertLimits {
        &self.alert_limits
    }

    pub fn edci_weights(&self) -> &EdciWeights {
        &self.edci_weights
    }
}

/// Resolve the configuration file path without reading environment variables.
///
/// An explicit flag wins over the value of [`crate::constants::CONFIG_ENV_VAR`]; blank values
/// are treated as unset. `None` means "run with defaults".
pub fn resolve_config_path(
    flag: Option<PathBuf>,
    env_value: Option<String>,
) -> Option<PathBuf> {
    flag.or_else(|| {
        env_value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

/// Load configuration from an optional path, falling back to defaults.
///
/// # Errors
///
/// Propagates [`EngineConfig::load`] errors.
pub fn load_or_default(path: Option<&Path>) -> ConfigResult<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct EngineConfigWire {
    severity: SeverityWire,
    alert_limits: AlertLimits,
    edci_weights: EdciWeights,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SeverityWire {
    warning: f64,
    emergency: f64,
}

impl Default for SeverityWire {
    fn default() -> Self {
        Self {
            warning: DEFAULT_WARNING_EDCI,
            emergency: DEFAULT_EMERGENCY_EDCI,
        }
    }
}
