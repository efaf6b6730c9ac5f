//! Cycle evaluation.
//!
//! A cycle is a pure map-then-reduce over an immutable batch of [`ReadingRecord`]s: every record
//! is validated, enriched, classified and diagnosed on its own, failures are collected without
//! affecting other facilities, and the fleet summary is computed once every per-facility result
//! exists. The engine holds no state between cycles; evaluating the same batch twice yields
//! identical reports.

use std::sync::Arc;

use serde::Serialize;

use crate::alerts::{derive_alert_reasons, AlertReason};
use crate::config::EngineConfig;
use crate::error::DataIntegrityError;
use crate::fleet::{ranked_by_congestion, summarize, FleetSummary};
use crate::metrics::{enrich, DerivedMetrics};
use crate::reading::{RawReading, ReadingRecord};
use crate::severity::{classify, Status};

/// The engine's output for one facility: raw fields, derived metrics, status and reasons.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FacilityAssessment {
    pub reading: RawReading,
    pub metrics: DerivedMetrics,
    pub status: Status,
    pub alert_reasons: Vec<AlertReason>,
}

impl FacilityAssessment {
    pub fn id(&self) -> &str {
        self.reading.id.as_str()
    }

    pub fn has_alerts(&self) -> bool {
        !self.alert_reasons.is_empty()
    }
}

/// Assess a single record.
///
/// # Errors
///
/// Returns a [`DataIntegrityError`] identifying the facility and field if the record violates a
/// structural invariant or a ratio cannot be computed.
pub fn assess(
    record: &ReadingRecord,
    cfg: &EngineConfig,
) -> Result<FacilityAssessment, DataIntegrityError> {
    let reading = RawReading::try_from(record)?;
    let enriched = enrich(reading, cfg.edci_weights())?;
    let status = classify(enriched.metrics.edci, cfg.severity());
    let alert_reasons = derive_alert_reasons(&enriched, cfg.alert_limits());

    Ok(FacilityAssessment {
        reading: enriched.reading,
        metrics: enriched.metrics,
        status,
        alert_reasons,
    })
}

/// Result of evaluating one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    /// Number of records the provider supplied.
    pub reported: usize,
    /// Successfully assessed facilities, in input order.
    pub facilities: Vec<FacilityAssessment>,
    /// Facilities excluded from this cycle, in input order.
    #[serde(serialize_with = "serialize_rejections")]
    pub rejected: Vec<DataIntegrityError>,
    /// Aggregate over `facilities`.
    pub summary: FleetSummary,
}

impl CycleReport {
    /// `true` when the provider reported no facilities at all.
    pub fn is_empty_batch(&self) -> bool {
        self.reported == 0
    }

    /// `true` when facilities were reported but every one of them failed validation.
    pub fn all_rejected(&self) -> bool {
        self.reported > 0 && self.facilities.is_empty()
    }

    pub fn facility(&self, id: &str) -> Option<&FacilityAssessment> {
        self.facilities.iter().find(|a| a.id() == id)
    }

    pub fn facilities_with_status(&self, status: Status) -> Vec<&FacilityAssessment> {
        self.facilities
            .iter()
            .filter(|a| a.status == status)
            .collect()
    }

    /// Facilities by descending EDCI.
    pub fn ranked_by_congestion(&self) -> Vec<&FacilityAssessment> {
        ranked_by_congestion(&self.facilities)
    }
}

fn serialize_rejections<S>(rejected: &[DataIntegrityError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    #[derive(Serialize)]
    struct Rejection<'a> {
        facility_id: &'a str,
        field: &'static str,
        message: String,
    }

    let mut seq = serializer.serialize_seq(Some(rejected.len()))?;
    for err in rejected {
        seq.serialize_element(&Rejection {
            facility_id: err.facility_id(),
            field: err.field(),
            message: err.to_string(),
        })?;
    }
    seq.end()
}

/// Evaluate a whole batch against an explicit configuration.
pub fn evaluate_cycle(records: &[ReadingRecord], cfg: &EngineConfig) -> CycleReport {
    let mut facilities = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for record in records {
        match assess(record, cfg) {
            Ok(assessment) => facilities.push(assessment),
            Err(err) => {
                tracing::warn!(
                    facility_id = err.facility_id(),
                    field = err.field(),
                    "excluding facility from cycle: {}",
                    err
                );
                rejected.push(err);
            }
        }
    }

    let summary = summarize(&facilities);
    tracing::debug!(
        "evaluated cycle: {} reported, {} assessed, {} rejected",
        records.len(),
        facilities.len(),
        rejected.len()
    );

    CycleReport {
        reported: records.len(),
        facilities,
        rejected,
        summary,
    }
}

/// Congestion engine bound to a validated configuration.
///
/// Cheap to clone and safe to share between threads; it holds nothing but the configuration.
#[derive(Debug, Clone)]
pub struct CongestionEngine {
    cfg: Arc<EngineConfig>,
}

impl CongestionEngine {
    pub fn new(cfg: Arc<EngineConfig>) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Assess one record with this engine's configuration.
    ///
    /// # Errors
    ///
    /// See [`assess`].
    pub fn assess(&self, record: &ReadingRecord) -> Result<FacilityAssessment, DataIntegrityError> {
        assess(record, &self.cfg)
    }

    /// Evaluate one cycle with this engine's configuration.
    pub fn evaluate_cycle(&self, records: &[ReadingRecord]) -> CycleReport {
        evaluate_cycle(records, &self.cfg)
    }
}

impl Default for CongestionEngine {
    fn default() -> Self {
        Self::new(Arc::new(EngineConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use crate::config::{AlertLimits, EdciWeights, SeverityThresholds};
    use crate::reading::tests::sample_record;

    fn worked_example_record() -> ReadingRecord {
        let mut record = sample_record("linkou-chang-gung");
        record.doctor_weighted_patients = 150.0;
        record.effective_doctor_fte = 1.5;
        record.nurse_weighted_patients = 80.0;
        record.nurses = 4;
        record.edci = Some(22.0);
        record
    }

    fn worked_example_config() -> EngineConfig {
        let limits = AlertLimits {
            physician_pressure: 80.0,
            nurse_pressure: 40.0,
            ..AlertLimits::default()
        };
        EngineConfig::new(
            SeverityThresholds::new(15.0, 20.0).expect("thresholds"),
            limits,
            EdciWeights::default(),
        )
        .expect("config")
    }

    #[test]
    fn worked_example() {
        let assessment =
            assess(&worked_example_record(), &worked_example_config()).expect("assessment");

        assert_eq!(assessment.metrics.adjusted_pbr, 100.0);
        assert_eq!(assessment.metrics.nbr, 20.0);
        assert_eq!(assessment.status, Status::Emergency);
        let messages: Vec<&str> = assessment
            .alert_reasons
            .iter()
            .map(|r| r.message.as_str())
            .collect();
        assert_eq!(messages, vec!["physician pressure ratio exceeds limit (100.0)"]);
    }

    #[test]
    fn normal_status_can_still_carry_reasons() {
        let mut record = worked_example_record();
        record.edci = Some(9.0);
        let assessment = assess(&record, &worked_example_config()).expect("assessment");

        assert_eq!(assessment.status, Status::Normal);
        assert!(assessment.has_alerts());
        assert_eq!(assessment.alert_reasons[0].kind, AlertKind::PhysicianPressure);
    }

    #[test]
    fn emergency_status_can_have_no_reasons() {
        let mut record = worked_example_record();
        record.doctor_weighted_patients = 90.0;
        record.edci = Some(27.0);
        let assessment = assess(&record, &worked_example_config()).expect("assessment");

        assert_eq!(assessment.status, Status::Emergency);
        assert!(assessment.alert_reasons.is_empty());
    }

    #[test]
    fn invalid_facility_does_not_affect_others() {
        let mut broken = sample_record("st-paul");
        broken.effective_doctor_fte = 0.0;
        let records = vec![
            sample_record("linkou-chang-gung"),
            broken,
            sample_record("min-sheng"),
        ];

        let report = evaluate_cycle(&records, &EngineConfig::default());
        assert_eq!(report.reported, 3);
        assert_eq!(report.facilities.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].facility_id(), "st-paul");
        assert_eq!(report.rejected[0].field(), "effectiveDoctorFTE");
        assert_eq!(report.summary.facility_count, 2);
        assert!(!report.all_rejected());
    }

    #[test]
    fn overflowing_ratio_rejects_the_facility() {
        let mut overflowing = sample_record("st-paul");
        overflowing.doctor_weighted_patients = 1e300;
        overflowing.effective_doctor_fte = 1e-10;
        overflowing.edci = None;
        let records = vec![sample_record("linkou-chang-gung"), overflowing];

        let report = evaluate_cycle(&records, &EngineConfig::default());
        assert_eq!(report.facilities.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].facility_id(), "st-paul");
        assert_eq!(report.rejected[0].field(), "adjustedPBR");
        assert_eq!(report.summary.mean_edci, Some(12.0));
    }

    #[test]
    fn empty_batch_is_distinguished_from_all_rejected() {
        let empty = evaluate_cycle(&[], &EngineConfig::default());
        assert!(empty.is_empty_batch());
        assert!(!empty.all_rejected());
        assert_eq!(empty.summary.mean_edci, None);

        let mut broken = sample_record("st-paul");
        broken.nurses = -3;
        let rejected = evaluate_cycle(&[broken], &EngineConfig::default());
        assert!(!rejected.is_empty_batch());
        assert!(rejected.all_rejected());
        assert_eq!(rejected.summary.mean_edci, None);
        assert_eq!(rejected.rejected[0].field(), "nurses");
    }

    #[test]
    fn evaluation_is_deterministic() {
        let mut derived = sample_record("tian-sheng");
        derived.edci = None;
        let records = vec![sample_record("landseed"), derived];
        let engine = CongestionEngine::default();

        let first = engine.evaluate_cycle(&records);
        let second = engine.evaluate_cycle(&records);
        assert_eq!(first, second);
        for (a, b) in first.facilities.iter().zip(&second.facilities) {
            assert_eq!(a.metrics.edci.to_bits(), b.metrics.edci.to_bits());
        }
    }

    #[test]
    fn lookup_and_filter_helpers() {
        let mut hot = sample_record("taoyuan-hospital");
        hot.edci = Some(24.0);
        let records = vec![sample_record("e-jen"), hot];
        let report = evaluate_cycle(&records, &EngineConfig::default());

        assert_eq!(
            report.facility("taoyuan-hospital").map(|a| a.status),
            Some(Status::Emergency)
        );
        assert!(report.facility("unknown").is_none());

        let emergencies = report.facilities_with_status(Status::Emergency);
        assert_eq!(emergencies.len(), 1);
        assert_eq!(emergencies[0].id(), "taoyuan-hospital");
        assert_eq!(report.ranked_by_congestion()[0].id(), "taoyuan-hospital");
    }

    #[test]
    fn report_serializes_rejections_with_context() {
        let mut broken = sample_record("st-paul");
        broken.triage_l2 = -1;
        let report = evaluate_cycle(&[broken], &EngineConfig::default());
        let json = serde_json::to_value(&report).expect("serialize");

        assert_eq!(json["reported"], 1);
        assert_eq!(json["rejected"][0]["facility_id"], "st-paul");
        assert_eq!(json["rejected"][0]["field"], "triageL2");
        assert!(json["rejected"][0]["message"]
            .as_str()
            .is_some_and(|m| m.contains("must not be negative")));
    }
}
