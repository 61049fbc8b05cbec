use defrost_client::{
    domain::{DateRange, EnergyMetrics, MetricsOutcome, UnavailableReason},
    queries::ZoneSeries,
};
use time::PrimitiveDateTime;

use super::EngineConfig;

/// Indices where the status steps up by exactly one.
///
/// The first sample never counts, having no predecessor.
pub fn rising_edges(statuses: &[f64]) -> Vec<usize> {
    statuses
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[1] - w[0] == 1.0)
        .map(|(i, _)| i + 1)
        .collect()
}

/// Defrost status per reading, missing values read as 0.
fn statuses(series: &ZoneSeries<'_>) -> Vec<f64> {
    series
        .readings
        .iter()
        .map(|r| r.defrost_status.unwrap_or(0.0))
        .collect()
}

/// Timestamps at which a defrost cycle started.
pub fn defrost_events(series: &ZoneSeries<'_>) -> Vec<PrimitiveDateTime> {
    rising_edges(&statuses(series))
        .into_iter()
        .map(|i| series.readings[i].ts)
        .collect()
}

/// Expected vs. actual defrost energy of one zone over `range`.
///
/// The expected side depends only on the range length; the actual side
/// counts rising edges of the status signal. A zone whose export carries no
/// defrost-status column is reported as unavailable.
pub fn compute_metrics(
    series: &ZoneSeries<'_>,
    rated_power_kw: f64,
    range: DateRange,
    config: &EngineConfig,
) -> MetricsOutcome {
    if !series.columns.defrost_status {
        return MetricsOutcome::Unavailable {
            reason: UnavailableReason::MissingDefrostStatus,
        };
    }

    let expected_cycles = u64::from(config.cycles_per_day) * range.inclusive_days();
    let actual_cycles = rising_edges(&statuses(series)).len() as u64;

    let per_cycle_kwh = rated_power_kw * config.cycle_hours;
    MetricsOutcome::Computed(EnergyMetrics::from_totals(
        per_cycle_kwh * expected_cycles as f64,
        per_cycle_kwh * actual_cycles as f64,
        expected_cycles,
        actual_cycles,
    ))
}

/// Sums the computed outcomes; unavailable ones are left out.
pub fn aggregate<'a, I>(outcomes: I) -> EnergyMetrics
where
    I: IntoIterator<Item = &'a MetricsOutcome>,
{
    let (expected, actual, expected_cycles, actual_cycles) = outcomes
        .into_iter()
        .filter_map(|o| match o {
            MetricsOutcome::Computed(m) => Some(m),
            MetricsOutcome::Unavailable { .. } => None,
        })
        .fold((0.0, 0.0, 0u64, 0u64), |acc, m| {
            (
                acc.0 + m.expected_energy_kwh,
                acc.1 + m.actual_energy_kwh,
                acc.2 + m.expected_cycles,
                acc.3 + m.actual_cycles,
            )
        });

    EnergyMetrics::from_totals(expected, actual, expected_cycles, actual_cycles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use defrost_client::domain::{Reading, ZoneColumns};
    use time::macros::{date, datetime};

    fn readings(statuses: &[Option<f64>]) -> Vec<Reading> {
        let start = datetime!(2024-06-18 00:00);
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| Reading {
                ts: start + time::Duration::minutes(15 * i as i64),
                zone: "A".to_string(),
                ambient_temp_c: Some(-20.0),
                defrost_status: *s,
            })
            .collect()
    }

    fn series<'a>(readings: &'a [Reading], defrost_status: bool) -> ZoneSeries<'a> {
        ZoneSeries {
            zone: "A",
            columns: ZoneColumns {
                ambient_temperature: true,
                defrost_status,
            },
            readings: readings.iter().collect(),
        }
    }

    fn two_days() -> DateRange {
        DateRange::new(date!(2024-06-18), date!(2024-06-19)).unwrap()
    }

    #[test]
    fn rising_edges_count_only_zero_to_one_steps() {
        assert_eq!(rising_edges(&[0.0, 1.0, 0.0, 1.0, 1.0, 0.0]), vec![1, 3]);
        assert!(rising_edges(&[1.0, 1.0, 0.0, 0.0]).is_empty());
        assert!(rising_edges(&[]).is_empty());
        assert!(rising_edges(&[1.0]).is_empty());
    }

    #[test]
    fn missing_status_reads_as_zero() {
        let rows = readings(&[Some(1.0), None, Some(1.0), Some(0.0)]);
        let s = series(&rows, true);
        assert_eq!(defrost_events(&s), vec![rows[2].ts]);
    }

    #[test]
    fn expected_cycles_depend_only_on_the_range() {
        let config = EngineConfig::default();
        let rows = readings(&[Some(0.0), Some(1.0)]);
        let empty: Vec<Reading> = Vec::new();

        for rows in [&rows[..], &empty[..]] {
            let m = compute_metrics(&series(rows, true), 4.08, two_days(), &config).metrics();
            assert_eq!(m.expected_cycles, 8);
        }

        let fifteen = DateRange::new(date!(2024-06-18), date!(2024-07-02)).unwrap();
        let m = compute_metrics(&series(&rows, true), 4.08, fifteen, &config).metrics();
        assert_eq!(m.expected_cycles, 60);
    }

    #[test]
    fn two_day_scenario_matches_hand_computation() {
        // Six 0 -> 1 transitions over two days.
        let pattern: Vec<Option<f64>> = (0..12).map(|i| Some((i % 2) as f64)).collect();
        let rows = readings(&pattern);
        let config = EngineConfig::default();

        let outcome = compute_metrics(&series(&rows, true), 4.08, two_days(), &config);
        let m = match outcome {
            MetricsOutcome::Computed(m) => m,
            other => panic!("unexpected outcome {other:?}"),
        };

        assert_eq!(m.expected_cycles, 8);
        assert_eq!(m.actual_cycles, 6);
        assert!((m.expected_energy_kwh - 24.48).abs() < 1e-9);
        assert!((m.actual_energy_kwh - 18.36).abs() < 1e-9);
        assert!((m.savings_kwh - 6.12).abs() < 1e-9);
        assert!((m.savings_pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn zero_cycles_per_day_gives_zero_savings_pct() {
        let config = EngineConfig {
            cycles_per_day: 0,
            ..EngineConfig::default()
        };
        let rows = readings(&[Some(0.0), Some(1.0)]);

        let m = compute_metrics(&series(&rows, true), 4.08, two_days(), &config).metrics();
        assert_eq!(m.expected_cycles, 0);
        assert_eq!(m.savings_pct, 0.0);
    }

    #[test]
    fn missing_status_column_is_unavailable_and_all_zero() {
        let rows = readings(&[Some(0.0), Some(1.0)]);
        let outcome = compute_metrics(
            &series(&rows, false),
            4.08,
            two_days(),
            &EngineConfig::default(),
        );

        assert_eq!(
            outcome,
            MetricsOutcome::Unavailable {
                reason: UnavailableReason::MissingDefrostStatus
            }
        );
        let m = outcome.metrics();
        assert_eq!(
            (
                m.expected_energy_kwh,
                m.actual_energy_kwh,
                m.savings_kwh,
                m.savings_pct,
                m.expected_cycles,
                m.actual_cycles
            ),
            (0.0, 0.0, 0.0, 0.0, 0, 0)
        );
    }

    #[test]
    fn aggregate_sums_computed_zones_only() {
        let a = MetricsOutcome::Computed(EnergyMetrics::from_totals(24.48, 18.36, 8, 6));
        let b = MetricsOutcome::Computed(EnergyMetrics::from_totals(115.56, 57.78, 8, 4));
        let c = MetricsOutcome::Unavailable {
            reason: UnavailableReason::NoReadings,
        };

        let total = aggregate([&a, &b, &c]);
        assert_eq!(total.expected_cycles, 16);
        assert_eq!(total.actual_cycles, 10);
        assert!((total.expected_energy_kwh - 140.04).abs() < 1e-9);
        assert!((total.actual_energy_kwh - 76.14).abs() < 1e-9);
        assert!((total.savings_pct - 63.9 / 140.04 * 100.0).abs() < 1e-9);
    }
}
