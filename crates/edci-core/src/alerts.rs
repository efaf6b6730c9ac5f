//! Alert-reason derivation.
//!
//! Per-metric diagnostics explaining why a facility looks congested. Reasons are independent of
//! the EDCI-based [`crate::Status`]: a `normal` facility can still carry reasons when a single
//! metric is out of bounds.

use serde::Serialize;

use crate::config::AlertLimits;
use crate::metrics::EnrichedReading;

/// The metric behind an alert reason, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AlertKind {
    PhysicianPressure,
    NursePressure,
    AdmissionBacklog,
    ProlongedStay,
    TransferDelay,
}

impl AlertKind {
    /// Every kind in the fixed order reasons are evaluated and reported.
    pub const EVALUATION_ORDER: [AlertKind; 5] = [
        AlertKind::PhysicianPressure,
        AlertKind::NursePressure,
        AlertKind::AdmissionBacklog,
        AlertKind::ProlongedStay,
        AlertKind::TransferDelay,
    ];

    /// Feed field name of the metric this kind inspects.
    pub fn metric(&self) -> &'static str {
        match self {
            Self::PhysicianPressure => "adjustedPBR",
            Self::NursePressure => "NBR",
            Self::AdmissionBacklog => "waitingForAdmission",
            Self::ProlongedStay => "over24Hours",
            Self::TransferDelay => "avgTransferTime",
        }
    }

    fn limit(&self, limits: &AlertLimits) -> f64 {
        match self {
            Self::PhysicianPressure => limits.physician_pressure,
            Self::NursePressure => limits.nurse_pressure,
            Self::AdmissionBacklog => f64::from(limits.admission_backlog),
            Self::ProlongedStay => f64::from(limits.prolonged_stay),
            Self::TransferDelay => limits.transfer_hours,
        }
    }

    fn value(&self, record: &EnrichedReading) -> f64 {
        let flow = &record.reading.flow;
        match self {
            Self::PhysicianPressure => record.metrics.adjusted_pbr,
            Self::NursePressure => record.metrics.nbr,
            Self::AdmissionBacklog => f64::from(flow.waiting_for_admission),
            Self::ProlongedStay => f64::from(flow.over_24_hours),
            Self::TransferDelay => flow.avg_transfer_time,
        }
    }

    fn message(&self, value: f64) -> String {
        match self {
            Self::PhysicianPressure => {
                format!("physician pressure ratio exceeds limit ({value:.1})")
            }
            Self::NursePressure => format!("nurse pressure ratio exceeds limit ({value:.1})"),
            Self::AdmissionBacklog => {
                format!("patients waiting for admission exceed limit ({value} patients)")
            }
            Self::ProlongedStay => {
                format!("patients held over 24 hours exceed limit ({value} patients)")
            }
            Self::TransferDelay => {
                format!("average transfer time exceeds limit ({value:.1} hours)")
            }
        }
    }
}

/// One reason a facility is flagged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlertReason {
    pub kind: AlertKind,
    /// Feed field name of the offending metric.
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub metric: &'static str,
    /// Observed value at full precision.
    pub value: f64,
    /// Configured limit that was exceeded.
    pub limit: f64,
    pub message: String,
}

/// Derive the alert reasons for an enriched reading.
///
/// Reasons appear in [`AlertKind::EVALUATION_ORDER`] regardless of how far each metric is out of
/// bounds. A metric fires only when it strictly exceeds its limit. An empty `Vec` means no
/// anomaly.
pub fn derive_alert_reasons(record: &EnrichedReading, limits: &AlertLimits) -> Vec<AlertReason> {
    AlertKind::EVALUATION_ORDER
        .iter()
        .filter_map(|kind| {
            let value = kind.value(record);
            let limit = kind.limit(limits);
            (value > limit).then(|| AlertReason {
                kind: *kind,
                metric: kind.metric(),
                value,
                limit,
                message: kind.message(value),
            })
        })
        .collect()
}
