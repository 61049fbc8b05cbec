//! Assembly of the per-zone and aggregate results shown to the operator.
//!
//! Problems that do not stop the report (a skipped export, a zone without
//! readings, a missing column) are collected as inline warnings instead of
//! failing the whole request.

pub mod render;

use std::collections::BTreeSet;

use defrost_client::{
    domain::{
        ComplianceOutcome, DateRange, DateRangeError, EnergyMetrics, MetricsOutcome, MissingColumn,
        UnavailableReason, Zone,
    },
    queries::zone_series,
};
use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, PrimitiveDateTime};

use crate::{
    config::{validate_delta, ConfigError},
    engine::{aggregate, compute_metrics, defrost_events, temperature_compliance, EngineConfig},
    loader::LoadedTable,
};

pub use render::render_text;

/// Parses a `YYYY-MM-DD` date as given on the command line or in a query.
pub fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Energy summary across all zones.
    Efficiency,
    /// Temperature and defrost analysis per zone.
    Analysis,
    #[default]
    All,
}

impl ReportMode {
    fn efficiency(self) -> bool {
        matches!(self, ReportMode::Efficiency | ReportMode::All)
    }

    fn analysis(self) -> bool {
        matches!(self, ReportMode::Analysis | ReportMode::All)
    }
}

/// What the operator asked for. Unset fields fall back to the table's date
/// bounds, the configured tolerance and every configured zone.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub start: Option<Date>,
    pub end: Option<Date>,
    pub delta_k: Option<f64>,
    pub mode: ReportMode,
    pub zones: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Range(#[from] DateRangeError),
    #[error(transparent)]
    Delta(#[from] ConfigError),
    #[error("zone '{0}' is not configured")]
    UnknownZone(String),
    #[error("loaded table has no readings")]
    EmptyTable,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneEfficiency {
    pub zone: String,
    pub rated_power_kw: f64,
    pub outcome: MetricsOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct EfficiencySection {
    pub total: EnergyMetrics,
    pub zones: Vec<ZoneEfficiency>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneAnalysis {
    pub zone: String,
    pub readings: usize,
    pub defrost_events: Vec<PrimitiveDateTime>,
    /// False when every temperature in the selection is missing.
    pub has_temperature_data: bool,
    pub compliance: ComplianceOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub range: DateRange,
    pub delta_k: f64,
    pub setpoint_c: f64,
    pub efficiency: Option<EfficiencySection>,
    pub analyses: Vec<ZoneAnalysis>,
    pub warnings: Vec<String>,
}

fn missing_columns_label(missing: &[MissingColumn]) -> String {
    missing
        .iter()
        .map(|c| match c {
            MissingColumn::AmbientTemperature => "ambient temperature",
            MissingColumn::DefrostStatus => "defrost status",
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn resolve_range(loaded: &LoadedTable, request: &ReportRequest) -> Result<DateRange, ReportError> {
    let bounds = loaded.table.date_bounds().ok_or(ReportError::EmptyTable)?;
    let start = request.start.unwrap_or(bounds.start());
    let end = request.end.unwrap_or(bounds.end());
    Ok(DateRange::new(start, end)?)
}

fn efficiency_section(
    loaded: &LoadedTable,
    zones: &[Zone],
    range: DateRange,
    engine: &EngineConfig,
    skipped: &BTreeSet<&str>,
    warnings: &mut Vec<String>,
) -> EfficiencySection {
    let zones: Vec<ZoneEfficiency> = zones
        .iter()
        .map(|zone| {
            let series = zone_series(&loaded.table, &zone.name, range);
            let outcome = if series.is_empty() {
                MetricsOutcome::Unavailable {
                    reason: UnavailableReason::NoReadings,
                }
            } else {
                compute_metrics(&series, zone.rated_power_kw, range, engine)
            };

            match outcome {
                MetricsOutcome::Unavailable {
                    reason: UnavailableReason::NoReadings,
                } if !skipped.contains(zone.name.as_str()) => {
                    warnings.push(format!("{}: no readings in the selected period", zone.name))
                }
                MetricsOutcome::Unavailable {
                    reason: UnavailableReason::MissingDefrostStatus,
                } => warnings.push(format!("{}: defrost status column not found", zone.name)),
                _ => {}
            }

            ZoneEfficiency {
                zone: zone.name.clone(),
                rated_power_kw: zone.rated_power_kw,
                outcome,
            }
        })
        .collect();

    EfficiencySection {
        total: aggregate(zones.iter().map(|z| &z.outcome)),
        zones,
    }
}

fn zone_analysis(
    loaded: &LoadedTable,
    zone: &Zone,
    range: DateRange,
    delta_k: f64,
    engine: &EngineConfig,
    skipped: &BTreeSet<&str>,
    warnings: &mut Vec<String>,
) -> Option<ZoneAnalysis> {
    let series = zone_series(&loaded.table, &zone.name, range);
    if series.is_empty() {
        if !skipped.contains(zone.name.as_str()) {
            warnings.push(format!("{}: no readings in the selected period", zone.name));
        }
        return None;
    }

    let compliance = temperature_compliance(&series, delta_k, engine);
    if let ComplianceOutcome::Unavailable { missing } = &compliance {
        warnings.push(format!(
            "{}: required columns not found: {}",
            zone.name,
            missing_columns_label(missing)
        ));
    }

    let has_temperature_data = series.readings.iter().any(|r| r.ambient_temp_c.is_some());
    if series.columns.ambient_temperature && !has_temperature_data {
        warnings.push(format!("{}: no valid temperature data", zone.name));
    }

    let defrost_events = if series.columns.defrost_status {
        defrost_events(&series)
    } else {
        Vec::new()
    };

    Some(ZoneAnalysis {
        zone: zone.name.clone(),
        readings: series.len(),
        defrost_events,
        has_temperature_data,
        compliance,
    })
}

/// Builds the report for one request over an already loaded table.
pub fn build_report(
    loaded: &LoadedTable,
    zones: &[Zone],
    engine: &EngineConfig,
    default_delta_k: f64,
    request: &ReportRequest,
) -> Result<Report, ReportError> {
    let range = resolve_range(loaded, request)?;
    let delta_k = validate_delta(request.delta_k.unwrap_or(default_delta_k))?;

    let selected: Vec<&Zone> = if request.zones.is_empty() {
        zones.iter().collect()
    } else {
        request
            .zones
            .iter()
            .map(|name| {
                zones
                    .iter()
                    .find(|z| &z.name == name)
                    .ok_or_else(|| ReportError::UnknownZone(name.clone()))
            })
            .collect::<Result<_, _>>()?
    };

    // Sources skipped at load time are reported once, not again per section.
    let skipped: BTreeSet<&str> = loaded.skipped.iter().map(|s| s.zone.as_str()).collect();
    let mut warnings: Vec<String> = loaded.skipped.iter().map(|s| s.to_string()).collect();

    let efficiency = request
        .mode
        .efficiency()
        .then(|| efficiency_section(loaded, zones, range, engine, &skipped, &mut warnings));

    let analyses = if request.mode.analysis() {
        selected
            .into_iter()
            .filter_map(|zone| {
                zone_analysis(loaded, zone, range, delta_k, engine, &skipped, &mut warnings)
            })
            .collect()
    } else {
        Vec::new()
    };

    let mut seen = BTreeSet::new();
    warnings.retain(|w| seen.insert(w.clone()));

    tracing::info!(
        start = %range.start(),
        end = %range.end(),
        delta_k,
        analyses = analyses.len(),
        warnings = warnings.len(),
        "report built"
    );

    Ok(Report {
        range,
        delta_k,
        setpoint_c: engine.setpoint_c,
        efficiency,
        analyses,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{SkipReason, SkippedSource};
    use defrost_client::domain::{Reading, ReadingTable, ZoneColumns};
    use std::collections::BTreeMap;
    use time::{
        macros::{date, datetime},
        Duration,
    };

    fn zones() -> Vec<Zone> {
        vec![
            Zone::new("Frozen Storage", 19.26),
            Zone::new("Step-in Master", 4.08),
            Zone::new("Step-in Slave", 4.08),
        ]
    }

    /// Two days of Step-in Master readings every 15 minutes with a defrost
    /// every six hours; Step-in Slave has no defrost column; Frozen Storage
    /// failed to load.
    fn loaded() -> LoadedTable {
        let start = datetime!(2024-06-18 00:00);
        let mut readings = Vec::new();
        for i in 0..(2 * 96) {
            let ts = start + Duration::minutes(15 * i);
            let status = if i % 24 == 1 { 1.0 } else { 0.0 };
            readings.push(Reading {
                ts,
                zone: "Step-in Master".to_string(),
                ambient_temp_c: Some(-20.0),
                defrost_status: Some(status),
            });
            readings.push(Reading {
                ts,
                zone: "Step-in Slave".to_string(),
                ambient_temp_c: Some(-19.0),
                defrost_status: None,
            });
        }

        let mut columns = BTreeMap::new();
        columns.insert(
            "Step-in Master".to_string(),
            ZoneColumns {
                ambient_temperature: true,
                defrost_status: true,
            },
        );
        columns.insert(
            "Step-in Slave".to_string(),
            ZoneColumns {
                ambient_temperature: true,
                defrost_status: false,
            },
        );

        LoadedTable {
            table: ReadingTable::new(readings, columns),
            skipped: vec![SkippedSource {
                zone: "Frozen Storage".to_string(),
                path: "frozen.csv".into(),
                reason: SkipReason::Empty,
            }],
        }
    }

    #[test]
    fn default_request_covers_table_bounds_and_all_zones() {
        let report = build_report(
            &loaded(),
            &zones(),
            &EngineConfig::default(),
            2.0,
            &ReportRequest::default(),
        )
        .unwrap();

        assert_eq!(report.range.start(), date!(2024-06-18));
        assert_eq!(report.range.end(), date!(2024-06-19));
        assert_eq!(report.delta_k, 2.0);

        let efficiency = report.efficiency.unwrap();
        let master = &efficiency.zones[1];
        assert_eq!(master.zone, "Step-in Master");
        let m = master.outcome.metrics();
        assert_eq!(m.expected_cycles, 8);
        assert_eq!(m.actual_cycles, 8);
        assert_eq!(m.savings_kwh, 0.0);

        assert_eq!(
            efficiency.zones[0].outcome,
            MetricsOutcome::Unavailable {
                reason: UnavailableReason::NoReadings
            }
        );
        assert_eq!(
            efficiency.zones[2].outcome,
            MetricsOutcome::Unavailable {
                reason: UnavailableReason::MissingDefrostStatus
            }
        );
        assert_eq!(efficiency.total, m);

        // Frozen Storage has no section; Step-in Slave lacks a column.
        assert_eq!(report.analyses.len(), 2);
        assert!(matches!(
            report.analyses[1].compliance,
            ComplianceOutcome::Unavailable { .. }
        ));
        assert!(report.warnings.iter().any(|w| w.contains("file is empty")));
        assert!(report.warnings.iter().any(|w| w.contains("defrost status column not found")));
    }

    #[test]
    fn skipped_source_is_warned_about_once() {
        let report = build_report(
            &loaded(),
            &zones(),
            &EngineConfig::default(),
            2.0,
            &ReportRequest::default(),
        )
        .unwrap();

        let frozen: Vec<_> = report
            .warnings
            .iter()
            .filter(|w| w.starts_with("Frozen Storage"))
            .collect();
        assert_eq!(frozen, vec!["Frozen Storage (frozen.csv): file is empty"]);
    }

    #[test]
    fn zone_without_readings_in_period_is_warned_about_once() {
        let request = ReportRequest {
            start: Some(date!(2024-07-01)),
            end: Some(date!(2024-07-02)),
            ..ReportRequest::default()
        };

        let report =
            build_report(&loaded(), &zones(), &EngineConfig::default(), 2.0, &request).unwrap();
        let master = report
            .warnings
            .iter()
            .filter(|w| w.starts_with("Step-in Master"))
            .count();
        assert_eq!(master, 1);
    }

    #[test]
    fn analysis_mode_reports_events_and_compliance() {
        let request = ReportRequest {
            mode: ReportMode::Analysis,
            zones: vec!["Step-in Master".to_string()],
            start: Some(date!(2024-06-18)),
            end: Some(date!(2024-06-18)),
            ..ReportRequest::default()
        };

        let report =
            build_report(&loaded(), &zones(), &EngineConfig::default(), 2.0, &request).unwrap();
        assert!(report.efficiency.is_none());
        assert_eq!(report.analyses.len(), 1);

        let analysis = &report.analyses[0];
        assert_eq!(analysis.readings, 96);
        assert_eq!(analysis.defrost_events.len(), 4);
        assert!(analysis.has_temperature_data);
        match &analysis.compliance {
            ComplianceOutcome::Computed { windows } => {
                // 2024-06-18 is a Tuesday: no weekend samples.
                assert!(windows[2].summary.is_none());
                assert_eq!(windows[0].summary.unwrap().compliance_pct, 100.0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn dates_parse_year_first() {
        assert_eq!(parse_date("2024-06-18").unwrap(), date!(2024-06-18));
        assert_eq!(parse_date(" 2024-06-18 ").unwrap(), date!(2024-06-18));
        assert!(parse_date("18/06/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn unknown_zone_is_rejected() {
        let request = ReportRequest {
            zones: vec!["Walk-in Cooler".to_string()],
            ..ReportRequest::default()
        };
        let err = build_report(&loaded(), &zones(), &EngineConfig::default(), 2.0, &request)
            .unwrap_err();
        assert!(matches!(err, ReportError::UnknownZone(_)));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let inverted = ReportRequest {
            start: Some(date!(2024-06-19)),
            end: Some(date!(2024-06-18)),
            ..ReportRequest::default()
        };
        let err = build_report(&loaded(), &zones(), &EngineConfig::default(), 2.0, &inverted)
            .unwrap_err();
        assert!(matches!(err, ReportError::Range(_)));

        let wide = ReportRequest {
            delta_k: Some(11.0),
            ..ReportRequest::default()
        };
        let err =
            build_report(&loaded(), &zones(), &EngineConfig::default(), 2.0, &wide).unwrap_err();
        assert!(matches!(err, ReportError::Delta(_)));
    }

    #[test]
    fn period_without_readings_is_skipped_with_warning() {
        let request = ReportRequest {
            start: Some(date!(2024-07-01)),
            end: Some(date!(2024-07-02)),
            ..ReportRequest::default()
        };

        let report =
            build_report(&loaded(), &zones(), &EngineConfig::default(), 2.0, &request).unwrap();
        assert!(report.analyses.is_empty());
        let efficiency = report.efficiency.unwrap();
        assert!(efficiency.zones.iter().all(|z| !z.outcome.is_computed()));
        assert_eq!(efficiency.total.expected_cycles, 0);
        assert_eq!(efficiency.total.savings_pct, 0.0);
    }
}
