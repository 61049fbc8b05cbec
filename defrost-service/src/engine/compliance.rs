use std::collections::BTreeMap;

use defrost_client::{
    domain::{ComplianceOutcome, ComplianceSummary, MissingColumn, PeriodWindow, WindowCompliance},
    queries::ZoneSeries,
};
use time::PrimitiveDateTime;

use super::{defrost::defrost_events, EngineConfig};

/// Carries the last seen value forward over missing ones. Leading gaps stay
/// missing.
pub fn forward_fill<I>(values: I) -> Vec<Option<f64>>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut last = None;
    values
        .into_iter()
        .map(|v| {
            if v.is_some() {
                last = v;
            }
            last
        })
        .collect()
}

/// Marks the samples lying in any post-defrost recovery window
/// `(t0 + recovery_start, t0 + recovery_end]`.
///
/// `timestamps` must be sorted ascending.
pub fn recovery_mask(
    timestamps: &[PrimitiveDateTime],
    events: &[PrimitiveDateTime],
    config: &EngineConfig,
) -> Vec<bool> {
    let mut mask = vec![false; timestamps.len()];

    for &t0 in events {
        let open = t0 + config.recovery_start;
        let close = t0 + config.recovery_end;
        let from = timestamps.partition_point(|&t| t <= open);
        let to = timestamps.partition_point(|&t| t <= close);
        for excluded in &mut mask[from..to.max(from)] {
            *excluded = true;
        }
    }

    mask
}

fn summarize(samples: &[f64], setpoint_c: f64, delta_k: f64) -> Option<ComplianceSummary> {
    if samples.is_empty() {
        return None;
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let within = samples
        .iter()
        .filter(|t| (*t - setpoint_c).abs() <= delta_k)
        .count();

    Some(ComplianceSummary {
        mean_temp_c: mean,
        compliance_pct: within as f64 / n * 100.0,
        samples: samples.len(),
    })
}

/// Mean temperature and share of samples within `delta_k` of the setpoint,
/// per period window, leaving out post-defrost recovery samples.
///
/// Both the temperature and the defrost-status columns are required; the
/// outcome lists whichever is missing otherwise.
pub fn temperature_compliance(
    series: &ZoneSeries<'_>,
    delta_k: f64,
    config: &EngineConfig,
) -> ComplianceOutcome {
    let mut missing = Vec::new();
    if !series.columns.ambient_temperature {
        missing.push(MissingColumn::AmbientTemperature);
    }
    if !series.columns.defrost_status {
        missing.push(MissingColumn::DefrostStatus);
    }
    if !missing.is_empty() {
        return ComplianceOutcome::Unavailable { missing };
    }

    let timestamps: Vec<PrimitiveDateTime> = series.readings.iter().map(|r| r.ts).collect();
    let temps = forward_fill(series.readings.iter().map(|r| r.ambient_temp_c));
    let events = defrost_events(series);
    let in_recovery = recovery_mask(&timestamps, &events, config);

    let mut buckets: BTreeMap<PeriodWindow, Vec<f64>> = BTreeMap::new();
    for ((ts, temp), excluded) in timestamps.iter().zip(&temps).zip(&in_recovery) {
        if let (Some(t), false) = (temp, excluded) {
            buckets.entry(PeriodWindow::classify(*ts)).or_default().push(*t);
        }
    }

    let windows = PeriodWindow::ALL
        .iter()
        .map(|&window| WindowCompliance {
            window,
            summary: buckets
                .get(&window)
                .and_then(|samples| summarize(samples, config.setpoint_c, delta_k)),
        })
        .collect();

    ComplianceOutcome::Computed { windows }
}
