pub mod domain;
pub mod queries;

pub use domain::{
    ComplianceOutcome, ComplianceSummary, DateRange, DateRangeError, EnergyMetrics, MetricsOutcome,
    MissingColumn, PeriodWindow, Reading, ReadingTable, UnavailableReason, WindowCompliance, Zone,
    ZoneColumns,
};
pub use queries::{zone_series, ZoneSeries};
