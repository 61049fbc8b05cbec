use super::period::PeriodWindow;

/// Expected vs. actual defrost energy for a zone (or a sum of zones).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EnergyMetrics {
    pub expected_energy_kwh: f64,
    pub actual_energy_kwh: f64,
    pub savings_kwh: f64,
    pub savings_pct: f64,
    pub expected_cycles: u64,
    pub actual_cycles: u64,
}

impl EnergyMetrics {
    /// Derives savings from expected and actual energy.
    ///
    /// `savings_pct` is 0 when nothing was expected.
    pub fn from_totals(
        expected_energy_kwh: f64,
        actual_energy_kwh: f64,
        expected_cycles: u64,
        actual_cycles: u64,
    ) -> Self {
        let savings_kwh = expected_energy_kwh - actual_energy_kwh;
        let savings_pct = if expected_energy_kwh != 0.0 {
            savings_kwh / expected_energy_kwh * 100.0
        } else {
            0.0
        };

        Self {
            expected_energy_kwh,
            actual_energy_kwh,
            savings_kwh,
            savings_pct,
            expected_cycles,
            actual_cycles,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnavailableReason {
    /// The zone export has no defrost-status column.
    MissingDefrostStatus,
    /// The zone has no readings inside the selected range.
    NoReadings,
}

/// Result of the defrost energy computation for one zone.
///
/// `Unavailable` keeps the all-zero figures reachable through
/// [`MetricsOutcome::metrics`] while letting callers tell "no data" apart
/// from "zero consumption".
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum MetricsOutcome {
    Computed(EnergyMetrics),
    Unavailable { reason: UnavailableReason },
}

impl MetricsOutcome {
    pub fn metrics(&self) -> EnergyMetrics {
        match self {
            MetricsOutcome::Computed(m) => *m,
            MetricsOutcome::Unavailable { .. } => EnergyMetrics::default(),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, MetricsOutcome::Computed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ComplianceSummary {
    pub mean_temp_c: f64,
    pub compliance_pct: f64,
    pub samples: usize,
}

/// Temperature performance of one period window. `summary` is `None` when
/// no valid sample remained after recovery exclusion ("not applicable").
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WindowCompliance {
    pub window: PeriodWindow,
    pub summary: Option<ComplianceSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MissingColumn {
    AmbientTemperature,
    DefrostStatus,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum ComplianceOutcome {
    Computed { windows: Vec<WindowCompliance> },
    Unavailable { missing: Vec<MissingColumn> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_follow_expected_and_actual() {
        let m = EnergyMetrics::from_totals(24.48, 18.36, 8, 6);
        assert!((m.savings_kwh - 6.12).abs() < 1e-9);
        assert!((m.savings_pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn savings_pct_is_zero_without_expected_energy() {
        let m = EnergyMetrics::from_totals(0.0, 0.0, 0, 0);
        assert_eq!(m.savings_pct, 0.0);
        assert!(!m.savings_pct.is_nan());
    }

    #[test]
    fn unavailable_outcome_reads_as_zero() {
        let outcome = MetricsOutcome::Unavailable {
            reason: UnavailableReason::MissingDefrostStatus,
        };
        assert!(!outcome.is_computed());
        assert_eq!(outcome.metrics(), EnergyMetrics::default());
    }
}
