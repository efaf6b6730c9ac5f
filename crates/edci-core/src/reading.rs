//! Raw per-facility readings.
//!
//! Providers hand the engine [`ReadingRecord`]s: a permissive wire model that mirrors the feed
//! (camelCase keys, signed counts, optional provider-computed fields). [`RawReading`] is the
//! validated domain form; converting between the two is where structural invariants are
//! enforced, one facility at a time.

use edci_types::{FacilityId, FacilityName};
use serde::{Deserialize, Serialize};

use crate::error::DataIntegrityError;

// ============================================================================
// Wire model
// ============================================================================

/// One facility's reading as delivered by a provider.
///
/// Unknown keys are ignored so feeds that still ship their own derived fields (`status`,
/// `adjustedPBR`, `NBR`) can be consumed unchanged; the engine always recomputes those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRecord {
    pub id: String,
    pub name: String,

    pub triage_l1: i64,
    pub triage_l2: i64,
    pub triage_l3: i64,
    pub triage_l4: i64,
    pub triage_l5: i64,
    /// Provider-reported total; checked against the triage sum when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_patients: Option<i64>,

    pub attending_physicians: i64,
    pub residents: i64,
    pub nurses: i64,

    pub waiting_for_admission: i64,
    pub over_24_hours: i64,
    pub avg_transfer_time: f64,

    pub doctor_weighted_patients: f64,
    #[serde(rename = "effectiveDoctorFTE")]
    pub effective_doctor_fte: f64,
    pub nurse_weighted_patients: f64,

    /// Provider-supplied congestion index. When absent the engine derives one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edci: Option<f64>,
}

// ============================================================================
// Domain model
// ============================================================================

/// Patients by triage acuity, L1 most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TriageCounts {
    pub l1: u32,
    pub l2: u32,
    pub l3: u32,
    pub l4: u32,
    pub l5: u32,
}

impl TriageCounts {
    pub fn total(&self) -> u64 {
        [self.l1, self.l2, self.l3, self.l4, self.l5]
            .iter()
            .map(|&n| u64::from(n))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Staffing {
    pub attending_physicians: u32,
    pub residents: u32,
    pub nurses: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PatientFlow {
    pub waiting_for_admission: u32,
    pub over_24_hours: u32,
    /// Average transfer time in hours.
    pub avg_transfer_time: f64,
}

/// Acuity-adjusted workload inputs for the pressure ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Workload {
    pub doctor_weighted_patients: f64,
    pub effective_doctor_fte: f64,
    pub nurse_weighted_patients: f64,
}

/// A validated, immutable facility reading for one cycle.
///
/// Counts are non-negative by construction and every real is finite. Positivity of the ratio
/// denominators (`effective_doctor_fte`, `nurses`) is checked by the metrics calculator, which is
/// where a zero would otherwise turn into an infinity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RawReading {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub id: FacilityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub name: FacilityName,
    pub triage: TriageCounts,
    pub staffing: Staffing,
    pub flow: PatientFlow,
    pub workload: Workload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_edci: Option<f64>,
}

impl RawReading {
    /// Total patients, always the sum of the five triage levels.
    pub fn total_patients(&self) -> u64 {
        self.triage.total()
    }
}

impl TryFrom<&ReadingRecord> for RawReading {
    type Error = DataIntegrityError;

    fn try_from(record: &ReadingRecord) -> Result<Self, Self::Error> {
        let raw_id = record.id.as_str();

        let id = FacilityId::new(raw_id).map_err(|reason| DataIntegrityError::InvalidIdentity {
            facility_id: raw_id.to_string(),
            field: "id",
            reason,
        })?;
        let name =
            FacilityName::new(&record.name).map_err(|reason| DataIntegrityError::InvalidIdentity {
                facility_id: raw_id.to_string(),
                field: "name",
                reason,
            })?;

        let triage = TriageCounts {
            l1: count(raw_id, "triageL1", record.triage_l1)?,
            l2: count(raw_id, "triageL2", record.triage_l2)?,
            l3: count(raw_id, "triageL3", record.triage_l3)?,
            l4: count(raw_id, "triageL4", record.triage_l4)?,
            l5: count(raw_id, "triageL5", record.triage_l5)?,
        };

        let staffing = Staffing {
            attending_physicians: count(raw_id, "attendingPhysicians", record.attending_physicians)?,
            residents: count(raw_id, "residents", record.residents)?,
            nurses: count(raw_id, "nurses", record.nurses)?,
        };

        let flow = PatientFlow {
            waiting_for_admission: count(
                raw_id,
                "waitingForAdmission",
                record.waiting_for_admission,
            )?,
            over_24_hours: count(raw_id, "over24Hours", record.over_24_hours)?,
            avg_transfer_time: non_negative(raw_id, "avgTransferTime", record.avg_transfer_time)?,
        };

        let workload = Workload {
            doctor_weighted_patients: non_negative(
                raw_id,
                "doctorWeightedPatients",
                record.doctor_weighted_patients,
            )?,
            effective_doctor_fte: finite(raw_id, "effectiveDoctorFTE", record.effective_doctor_fte)?,
            nurse_weighted_patients: non_negative(
                raw_id,
                "nurseWeightedPatients",
                record.nurse_weighted_patients,
            )?,
        };

        let reported_edci = record
            .edci
            .map(|edci| finite(raw_id, "edci", edci))
            .transpose()?;

        if let Some(reported) = record.total_patients {
            let computed = triage.total();
            if u64::try_from(reported).ok() != Some(computed) {
                return Err(DataIntegrityError::InconsistentTotal {
                    facility_id: raw_id.to_string(),
                    reported,
                    computed,
                });
            }
        }

        Ok(Self {
            id,
            name,
            triage,
            staffing,
            flow,
            workload,
            reported_edci,
        })
    }
}

fn count(facility_id: &str, field: &'static str, value: i64) -> Result<u32, DataIntegrityError> {
    if value < 0 {
        return Err(DataIntegrityError::NegativeCount {
            facility_id: facility_id.to_string(),
            field,
            value,
        });
    }
    u32::try_from(value).map_err(|_| DataIntegrityError::CountOutOfRange {
        facility_id: facility_id.to_string(),
        field,
        value,
    })
}

fn finite(facility_id: &str, field: &'static str, value: f64) -> Result<f64, DataIntegrityError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DataIntegrityError::NonFinite {
            facility_id: facility_id.to_string(),
            field,
        })
    }
}

fn non_negative(
    facility_id: &str,
    field: &'static str,
    value: f64,
) -> Result<f64, DataIntegrityError> {
    let value = finite(facility_id, field, value)?;
    if value < 0.0 {
        return Err(DataIntegrityError::NegativeValue {
            facility_id: facility_id.to_string(),
            field,
            value,
        });
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_record(id: &str) -> ReadingRecord {
        ReadingRecord {
            id: id.to_string(),
            name: "林口長庚醫院".to_string(),
            triage_l1: 4,
            triage_l2: 20,
            triage_l3: 30,
            triage_l4: 5,
            triage_l5: 1,
            total_patients: None,
            attending_physicians: 2,
            residents: 2,
            nurses: 4,
            waiting_for_admission: 12,
            over_24_hours: 2,
            avg_transfer_time: 3.5,
            doctor_weighted_patients: 150.0,
            effective_doctor_fte: 1.5,
            nurse_weighted_patients: 80.0,
            edci: Some(12.0),
        }
    }

    #[test]
    fn converts_valid_record() {
        let reading = RawReading::try_from(&sample_record("linkou-chang-gung")).expect("valid");
        assert_eq!(reading.id.as_str(), "linkou-chang-gung");
        assert_eq!(reading.total_patients(), 60);
        assert_eq!(reading.staffing.nurses, 4);
        assert_eq!(reading.reported_edci, Some(12.0));
    }

    #[test]
    fn rejects_negative_count_naming_the_field() {
        let mut record = sample_record("st-paul");
        record.over_24_hours = -1;
        let err = RawReading::try_from(&record).expect_err("negative count");
        assert_eq!(err.facility_id(), "st-paul");
        assert_eq!(err.field(), "over24Hours");
        assert!(matches!(err, DataIntegrityError::NegativeCount { value: -1, .. }));
    }

    #[test]
    fn rejects_count_beyond_u32() {
        let mut record = sample_record("st-paul");
        record.triage_l3 = i64::from(u32::MAX) + 1;
        let err = RawReading::try_from(&record).expect_err("count too large");
        assert!(matches!(err, DataIntegrityError::CountOutOfRange { field: "triageL3", .. }));
    }

    #[test]
    fn rejects_negative_transfer_time() {
        let mut record = sample_record("min-sheng");
        record.avg_transfer_time = -0.5;
        let err = RawReading::try_from(&record).expect_err("negative hours");
        assert_eq!(err.field(), "avgTransferTime");
    }

    #[test]
    fn rejects_non_finite_values() {
        let mut record = sample_record("landseed");
        record.nurse_weighted_patients = f64::NAN;
        let err = RawReading::try_from(&record).expect_err("nan load");
        assert!(matches!(
            err,
            DataIntegrityError::NonFinite {
                field: "nurseWeightedPatients",
                ..
            }
        ));

        let mut record = sample_record("landseed");
        record.edci = Some(f64::INFINITY);
        let err = RawReading::try_from(&record).expect_err("infinite edci");
        assert_eq!(err.field(), "edci");
    }

    #[test]
    fn rejects_blank_identity() {
        let record = sample_record("   ");
        let err = RawReading::try_from(&record).expect_err("blank id");
        assert_eq!(err.field(), "id");

        let mut record = sample_record("tian-sheng");
        record.name = String::new();
        let err = RawReading::try_from(&record).expect_err("blank name");
        assert_eq!(err.facility_id(), "tian-sheng");
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn checks_reported_total_against_triage_sum() {
        let mut record = sample_record("e-jen");
        record.total_patients = Some(60);
        assert!(RawReading::try_from(&record).is_ok());

        record.total_patients = Some(61);
        let err = RawReading::try_from(&record).expect_err("inconsistent total");
        assert_eq!(
            err,
            DataIntegrityError::InconsistentTotal {
                facility_id: "e-jen".into(),
                reported: 61,
                computed: 60,
            }
        );
    }

    #[test]
    fn zero_fte_passes_validation_and_is_left_to_the_calculator() {
        let mut record = sample_record("tian-cheng");
        record.effective_doctor_fte = 0.0;
        record.nurses = 0;
        assert!(RawReading::try_from(&record).is_ok());
    }

    #[test]
    fn deserializes_feed_field_names_and_ignores_derived_fields() {
        let json = r#"{
            "id": "taoyuan-hospital",
            "name": "部桃園醫院",
            "edci": 21.5,
            "status": "emergency",
            "totalPatients": 60,
            "triageL1": 4, "triageL2": 20, "triageL3": 30, "triageL4": 5, "triageL5": 1,
            "attendingPhysicians": 2, "residents": 1, "nurses": 5,
            "waitingForAdmission": 33, "over24Hours": 6, "avgTransferTime": 7.2,
            "doctorWeightedPatients": 180, "effectiveDoctorFTE": 2.0,
            "adjustedPBR": 90.0, "nurseWeightedPatients": 120, "NBR": 24.0
        }"#;
        let record: ReadingRecord = serde_json::from_str(json).expect("parse record");
        assert_eq!(record.over_24_hours, 6);
        assert_eq!(record.effective_doctor_fte, 2.0);
        assert_eq!(record.edci, Some(21.5));
        assert_eq!(record.total_patients, Some(60));
    }
}
