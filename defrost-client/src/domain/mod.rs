pub mod metrics;
pub mod period;
pub mod reading;
pub mod zone;

pub use metrics::{
    ComplianceOutcome, ComplianceSummary, EnergyMetrics, MetricsOutcome, MissingColumn,
    UnavailableReason, WindowCompliance,
};
pub use period::{DateRange, DateRangeError, PeriodWindow};
pub use reading::{Reading, ReadingTable, ZoneColumns};
pub use zone::Zone;
