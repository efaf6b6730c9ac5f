//! # EDCI Core
//!
//! Metrics derivation and alert classification for emergency-department congestion.
//!
//! This crate contains the pure evaluation engine:
//! - Validation of raw per-facility readings
//! - Pressure ratios (`adjustedPBR`, `NBR`) and the composite EDCI
//! - Severity classification and per-metric alert reasons
//! - Fleet-wide summaries over one evaluation cycle
//!
//! **No I/O concerns**: Reading providers, HTTP servers and the command line belong in
//! `edci-provider`, `api-rest` and `edci-cli`. The only file access here is loading an
//! [`EngineConfig`] at startup.

pub mod alerts;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod fleet;
pub mod metrics;
pub mod reading;
pub mod severity;

pub use alerts::{derive_alert_reasons, AlertKind, AlertReason};
pub use config::{
    load_or_default, resolve_config_path, AlertLimits, EdciWeights, EngineConfig,
    SeverityThresholds,
};
pub use engine::{assess, evaluate_cycle, CongestionEngine, CycleReport, FacilityAssessment};
pub use error::{ConfigError, ConfigResult, DataIntegrityError, Ratio};
pub use fleet::{ranked_by_congestion, summarize, FleetSummary, StatusCounts};
pub use metrics::{composite_edci, derive_metrics, enrich, DerivedMetrics, EdciSource, EnrichedReading};
pub use reading::{PatientFlow, RawReading, ReadingRecord, Staffing, TriageCounts, Workload};
pub use severity::{classify, ParseStatusError, Status};

pub use edci_types::{FacilityId, FacilityName, TextError};
