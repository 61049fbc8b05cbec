use std::fmt::Write;

use defrost_client::domain::{ComplianceOutcome, EnergyMetrics, MetricsOutcome, UnavailableReason};

use super::{EfficiencySection, Report, ZoneAnalysis};

fn write_metrics(out: &mut String, indent: &str, m: &EnergyMetrics) {
    let _ = writeln!(
        out,
        "{indent}expected: {:.1} kWh ({} cycles)",
        m.expected_energy_kwh, m.expected_cycles
    );
    let _ = writeln!(
        out,
        "{indent}actual:   {:.1} kWh ({} cycles)",
        m.actual_energy_kwh, m.actual_cycles
    );
    let _ = writeln!(
        out,
        "{indent}savings:  {:.1} kWh ({:.1}%)",
        m.savings_kwh, m.savings_pct
    );
}

fn write_efficiency(out: &mut String, section: &EfficiencySection) {
    let _ = writeln!(out, "== Energy efficiency ==");
    let _ = writeln!(out, "Total");
    write_metrics(out, "  ", &section.total);

    for zone in &section.zones {
        let _ = writeln!(out, "{} ({:.2} kW)", zone.zone, zone.rated_power_kw);
        match &zone.outcome {
            MetricsOutcome::Computed(m) => write_metrics(out, "  ", m),
            MetricsOutcome::Unavailable { reason } => {
                let why = match reason {
                    UnavailableReason::MissingDefrostStatus => "defrost status column not found",
                    UnavailableReason::NoReadings => "no readings",
                };
                let _ = writeln!(out, "  unavailable: {why}");
            }
        }
    }
}

fn write_analysis(out: &mut String, analysis: &ZoneAnalysis, delta_k: f64, setpoint_c: f64) {
    let _ = writeln!(out, "== {} ==", analysis.zone);
    let _ = writeln!(
        out,
        "readings: {}, defrost events: {}",
        analysis.readings,
        analysis.defrost_events.len()
    );

    match &analysis.compliance {
        ComplianceOutcome::Computed { windows } => {
            let _ = writeln!(out, "target: {setpoint_c:.1} °C ± {delta_k:.1} K");
            for w in windows {
                match w.summary {
                    Some(s) => {
                        let _ = writeln!(
                            out,
                            "  {:<20} mean {:>6.1} °C  compliance {:>5.1}%  ({} samples)",
                            w.window.label(),
                            s.mean_temp_c,
                            s.compliance_pct,
                            s.samples
                        );
                    }
                    None => {
                        let _ = writeln!(out, "  {:<20} N/A", w.window.label());
                    }
                }
            }
        }
        ComplianceOutcome::Unavailable { .. } => {
            let _ = writeln!(out, "  compliance unavailable");
        }
    }
}

/// Plain-text rendering of a report for terminal output.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Period: {} to {} ({} days)",
        report.range.start(),
        report.range.end(),
        report.range.inclusive_days()
    );

    if let Some(section) = &report.efficiency {
        let _ = writeln!(out);
        write_efficiency(&mut out, section);
    }

    for analysis in &report.analyses {
        let _ = writeln!(out);
        write_analysis(&mut out, analysis, report.delta_k, report.setpoint_c);
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Warnings:");
        for w in &report.warnings {
            let _ = writeln!(out, "  - {w}");
        }
    }

    out
}
