//! Fleet-wide aggregation over one cycle's facility assessments.

use serde::Serialize;

use crate::engine::FacilityAssessment;
use crate::severity::Status;

/// Number of facilities in each status band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusCounts {
    pub normal: usize,
    pub warning: usize,
    pub emergency: usize,
}

impl StatusCounts {
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Normal => self.normal,
            Status::Warning => self.warning,
            Status::Emergency => self.emergency,
        }
    }

    pub fn total(&self) -> usize {
        self.normal + self.warning + self.emergency
    }

    fn record(&mut self, status: Status) {
        match status {
            Status::Normal => self.normal += 1,
            Status::Warning => self.warning += 1,
            Status::Emergency => self.emergency += 1,
        }
    }
}

/// Aggregate view of a cycle.
///
/// `mean_edci` is `None` when no facility was assessed; it is never NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FleetSummary {
    pub facility_count: usize,
    pub total_patients: u64,
    pub total_waiting: u64,
    pub mean_edci: Option<f64>,
    pub status_counts: StatusCounts,
}

impl FleetSummary {
    /// Summary of a cycle with no assessed facilities.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Reduce a cycle's assessments into a [`FleetSummary`].
///
/// Sums fall back to zero and the mean to `None` for an empty slice. Status counts always add up
/// to `assessments.len()`.
///
/// The mean is a running average, so values near `f64::MAX` do not overflow a plain sum.
pub fn summarize(assessments: &[FacilityAssessment]) -> FleetSummary {
    let mut summary = FleetSummary::empty();
    let mut mean = 0.0_f64;

    for assessment in assessments {
        summary.facility_count += 1;
        summary.total_patients += assessment.reading.total_patients();
        summary.total_waiting += u64::from(assessment.reading.flow.waiting_for_admission);
        summary.status_counts.record(assessment.status);

        let n = summary.facility_count as f64;
        mean = mean * ((n - 1.0) / n) + assessment.metrics.edci / n;
    }

    if summary.facility_count > 0 {
        summary.mean_edci = Some(mean).filter(|m| m.is_finite());
    }

    summary
}

/// Assessments ordered by descending EDCI, ties broken by facility id.
pub fn ranked_by_congestion(assessments: &[FacilityAssessment]) -> Vec<&FacilityAssessment> {
    let mut ranked: Vec<&FacilityAssessment> = assessments.iter().collect();
    ranked.sort_by(|a, b| {
        b.metrics
            .edci
            .total_cmp(&a.metrics.edci)
            .then_with(|| a.reading.id.cmp(&b.reading.id))
    });
    ranked
}
