//! Default tuning values for the engine.
//!
//! These are only the fallbacks used by `EngineConfig::default()` and by configuration files
//! that omit a section. Classification and alerting always read the values from the
//! `EngineConfig` they are handed.

/// EDCI at or above which a facility is `warning`.
pub const DEFAULT_WARNING_EDCI: f64 = 15.0;

/// EDCI at or above which a facility is `emergency`.
pub const DEFAULT_EMERGENCY_EDCI: f64 = 20.0;

/// Physician pressure ratio above which an alert reason is raised.
pub const DEFAULT_PHYSICIAN_PRESSURE_LIMIT: f64 = 80.0;

/// Nurse pressure ratio above which an alert reason is raised.
pub const DEFAULT_NURSE_PRESSURE_LIMIT: f64 = 40.0;

/// Patients waiting for admission above which an alert reason is raised.
pub const DEFAULT_ADMISSION_BACKLOG_LIMIT: u32 = 30;

/// Patients held over 24 hours above which an alert reason is raised.
pub const DEFAULT_PROLONGED_STAY_LIMIT: u32 = 5;

/// Average transfer time in hours above which an alert reason is raised.
pub const DEFAULT_TRANSFER_HOURS_LIMIT: f64 = 6.0;

// Composite EDCI weights.
pub const DEFAULT_WEIGHT_PHYSICIAN_PRESSURE: f64 = 0.05;
pub const DEFAULT_WEIGHT_NURSE_PRESSURE: f64 = 0.10;
pub const DEFAULT_WEIGHT_ADMISSION_BACKLOG: f64 = 0.15;
pub const DEFAULT_WEIGHT_PROLONGED_STAY: f64 = 0.50;
pub const DEFAULT_WEIGHT_TRANSFER_HOURS: f64 = 1.00;

/// Environment variable naming the engine configuration file (read by binaries only).
pub const CONFIG_ENV_VAR: &str = "EDCI_CONFIG";
