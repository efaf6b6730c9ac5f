//! Derived-metrics calculator.
//!
//! Turns a validated [`RawReading`] into pressure ratios and a congestion index. Values are
//! returned at full precision; rounding for display is left to each view.

use serde::Serialize;

use crate::config::EdciWeights;
use crate::error::{DataIntegrityError, Ratio};
use crate::reading::RawReading;

/// Where a facility's EDCI came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EdciSource {
    /// Supplied by the reading provider.
    Reported,
    /// Computed by [`composite_edci`].
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DerivedMetrics {
    /// Doctor-weighted patient load per effective doctor FTE.
    pub adjusted_pbr: f64,
    /// Nurse-weighted patient load per nurse.
    pub nbr: f64,
    pub edci: f64,
    pub edci_source: EdciSource,
}

/// A reading together with the metrics derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EnrichedReading {
    pub reading: RawReading,
    pub metrics: DerivedMetrics,
}

/// Compute the derived metrics for one reading.
///
/// # Errors
///
/// Returns [`DataIntegrityError::NonPositiveDenominator`] if `effective_doctor_fte <= 0` or
/// `nurses == 0`, and [`DataIntegrityError::NonFiniteMetric`] if a ratio or the derived EDCI
/// overflows. A zero or infinite ratio is never substituted.
pub fn derive_metrics(
    reading: &RawReading,
    weights: &EdciWeights,
) -> Result<DerivedMetrics, DataIntegrityError> {
    let fte = reading.workload.effective_doctor_fte;
    if fte <= 0.0 {
        return Err(DataIntegrityError::NonPositiveDenominator {
            facility_id: reading.id.to_string(),
            ratio: Ratio::AdjustedPbr,
            field: "effectiveDoctorFTE",
            value: fte,
        });
    }

    let nurses = reading.staffing.nurses;
    if nurses == 0 {
        return Err(DataIntegrityError::NonPositiveDenominator {
            facility_id: reading.id.to_string(),
            ratio: Ratio::Nbr,
            field: "nurses",
            value: 0.0,
        });
    }

    let adjusted_pbr = finite_metric(
        reading,
        Ratio::AdjustedPbr.as_str(),
        reading.workload.doctor_weighted_patients / fte,
    )?;
    let nbr = finite_metric(
        reading,
        Ratio::Nbr.as_str(),
        reading.workload.nurse_weighted_patients / f64::from(nurses),
    )?;

    let (edci, edci_source) = match reading.reported_edci {
        Some(reported) => (reported, EdciSource::Reported),
        None => (
            finite_metric(
                reading,
                "edci",
                composite_edci(reading, adjusted_pbr, nbr, weights),
            )?,
            EdciSource::Derived,
        ),
    };

    Ok(DerivedMetrics {
        adjusted_pbr,
        nbr,
        edci,
        edci_source,
    })
}

fn finite_metric(
    reading: &RawReading,
    metric: &'static str,
    value: f64,
) -> Result<f64, DataIntegrityError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DataIntegrityError::NonFiniteMetric {
            facility_id: reading.id.to_string(),
            metric,
        })
    }
}

/// Enrich a reading with its derived metrics.
///
/// # Errors
///
/// See [`derive_metrics`].
pub fn enrich(
    reading: RawReading,
    weights: &EdciWeights,
) -> Result<EnrichedReading, DataIntegrityError> {
    let metrics = derive_metrics(&reading, weights)?;
    Ok(EnrichedReading { reading, metrics })
}

/// Weighted sum of the pressure ratios and flow metrics.
///
/// Every term is non-negative and every weight is non-negative, so the index never decreases
/// when any single input increases.
pub fn composite_edci(
    reading: &RawReading,
    adjusted_pbr: f64,
    nbr: f64,
    weights: &EdciWeights,
) -> f64 {
    weights.physician_pressure * adjusted_pbr
        + weights.nurse_pressure * nbr
        + weights.admission_backlog * f64::from(reading.flow.waiting_for_admission)
        + weights.prolonged_stay * f64::from(reading.flow.over_24_hours)
        + weights.transfer_hours * reading.flow.avg_transfer_time
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::tests::sample_record;

    fn reading() -> RawReading {
        RawReading::try_from(&sample_record("linkou-chang-gung")).expect("valid reading")
    }

    #[test]
    fn ratios_are_plain_quotients() {
        let metrics = derive_metrics(&reading(), &EdciWeights::default()).expect("metrics");
        assert_eq!(metrics.adjusted_pbr, 150.0 / 1.5);
        assert_eq!(metrics.nbr, 80.0 / 4.0);
    }

    #[test]
    fn ratios_keep_full_precision() {
        let mut r = reading();
        r.workload.doctor_weighted_patients = 100.0;
        r.workload.effective_doctor_fte = 3.0;
        r.workload.nurse_weighted_patients = 100.0;
        r.staffing.nurses = 7;

        let metrics = derive_metrics(&r, &EdciWeights::default()).expect("metrics");
        assert_eq!(metrics.adjusted_pbr, 100.0 / 3.0);
        assert_eq!(metrics.nbr, 100.0 / 7.0);
    }

    #[test]
    fn recomputation_is_bitwise_identical() {
        let mut r = reading();
        r.reported_edci = None;
        let first = derive_metrics(&r, &EdciWeights::default()).expect("metrics");
        let second = derive_metrics(&r, &EdciWeights::default()).expect("metrics");
        assert_eq!(first.adjusted_pbr.to_bits(), second.adjusted_pbr.to_bits());
        assert_eq!(first.nbr.to_bits(), second.nbr.to_bits());
        assert_eq!(first.edci.to_bits(), second.edci.to_bits());
    }

    #[test]
    fn zero_fte_is_an_integrity_error() {
        let mut r = reading();
        r.workload.effective_doctor_fte = 0.0;
        let err = derive_metrics(&r, &EdciWeights::default()).expect_err("zero fte");
        assert!(matches!(
            err,
            DataIntegrityError::NonPositiveDenominator {
                ratio: Ratio::AdjustedPbr,
                field: "effectiveDoctorFTE",
                ..
            }
        ));
        assert_eq!(err.facility_id(), "linkou-chang-gung");
    }

    #[test]
    fn negative_fte_is_an_integrity_error() {
        let mut r = reading();
        r.workload.effective_doctor_fte = -1.2;
        assert!(derive_metrics(&r, &EdciWeights::default()).is_err());
    }

    #[test]
    fn zero_nurses_is_an_integrity_error() {
        let mut r = reading();
        r.staffing.nurses = 0;
        let err = derive_metrics(&r, &EdciWeights::default()).expect_err("zero nurses");
        assert!(matches!(
            err,
            DataIntegrityError::NonPositiveDenominator {
                ratio: Ratio::Nbr,
                field: "nurses",
                ..
            }
        ));
    }

    #[test]
    fn overflowing_pbr_is_an_integrity_error() {
        let mut r = reading();
        r.reported_edci = None;
        r.workload.doctor_weighted_patients = 1e300;
        r.workload.effective_doctor_fte = 1e-10;
        let no_pbr_weight = EdciWeights {
            physician_pressure: 0.0,
            ..EdciWeights::default()
        };

        for weights in [EdciWeights::default(), no_pbr_weight] {
            let err = derive_metrics(&r, &weights).expect_err("overflowing ratio");
            assert!(matches!(
                err,
                DataIntegrityError::NonFiniteMetric {
                    metric: "adjustedPBR",
                    ..
                }
            ));
            assert_eq!(err.field(), "adjustedPBR");
            assert_eq!(err.facility_id(), "linkou-chang-gung");
        }
    }

    #[test]
    fn overflowing_derived_edci_is_an_integrity_error() {
        let mut r = reading();
        r.reported_edci = None;
        r.workload.doctor_weighted_patients = f64::MAX;
        r.workload.effective_doctor_fte = 1.0;
        r.flow.avg_transfer_time = f64::MAX;
        let weights = EdciWeights {
            physician_pressure: 1.0,
            transfer_hours: 1.0,
            ..EdciWeights::default()
        };

        let err = derive_metrics(&r, &weights).expect_err("overflowing edci");
        assert_eq!(err.field(), "edci");
    }

    #[test]
    fn reported_edci_is_used_verbatim() {
        let metrics = derive_metrics(&reading(), &EdciWeights::default()).expect("metrics");
        assert_eq!(metrics.edci, 12.0);
        assert_eq!(metrics.edci_source, EdciSource::Reported);
    }

    #[test]
    fn missing_edci_is_derived_from_weights() {
        let mut r = reading();
        r.reported_edci = None;
        let weights = EdciWeights {
            physician_pressure: 0.05,
            nurse_pressure: 0.1,
            admission_backlog: 0.15,
            prolonged_stay: 0.5,
            transfer_hours: 1.0,
        };
        let metrics = derive_metrics(&r, &weights).expect("metrics");
        let expected = 0.05 * 100.0 + 0.1 * 20.0 + 0.15 * 12.0 + 0.5 * 2.0 + 1.0 * 3.5;
        assert_eq!(metrics.edci_source, EdciSource::Derived);
        assert!((metrics.edci - expected).abs() < 1e-12);
    }

    #[test]
    fn composite_is_monotone_in_each_input() {
        let mut r = reading();
        r.reported_edci = None;
        let weights = EdciWeights::default();
        let base = derive_metrics(&r, &weights).expect("metrics").edci;

        let mut busier = r.clone();
        busier.flow.waiting_for_admission += 10;
        assert!(derive_metrics(&busier, &weights).expect("metrics").edci > base);

        let mut slower = r.clone();
        slower.flow.avg_transfer_time += 1.0;
        assert!(derive_metrics(&slower, &weights).expect("metrics").edci > base);

        let mut understaffed = r;
        understaffed.staffing.nurses = 2;
        assert!(derive_metrics(&understaffed, &weights).expect("metrics").edci > base);
    }

    #[test]
    fn enrich_keeps_the_original_reading() {
        let r = reading();
        let enriched = enrich(r.clone(), &EdciWeights::default()).expect("enriched");
        assert_eq!(enriched.reading, r);
        assert_eq!(enriched.metrics.adjusted_pbr, 100.0);
    }
}
