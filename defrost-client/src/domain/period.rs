use time::{Date, PrimitiveDateTime, Weekday};

/// Time-of-week bucket used to split temperature performance.
///
/// The three windows partition every (hour, weekday) pair:
/// - `Operation`: Monday to Friday, 08:00 up to 21:00.
/// - `OffHours`: Monday to Friday, 21:00 up to 08:00.
/// - `Weekend`: Saturday and Sunday, all day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PeriodWindow {
    Operation,
    OffHours,
    Weekend,
}

impl PeriodWindow {
    pub const ALL: [PeriodWindow; 3] = [
        PeriodWindow::Operation,
        PeriodWindow::OffHours,
        PeriodWindow::Weekend,
    ];

    pub const OPERATION_START_HOUR: u8 = 8;
    pub const OPERATION_END_HOUR: u8 = 21;

    /// The window an (hour, weekday) pair falls in.
    pub fn at(hour: u8, weekday: Weekday) -> PeriodWindow {
        if weekday.number_days_from_monday() >= 5 {
            PeriodWindow::Weekend
        } else if (Self::OPERATION_START_HOUR..Self::OPERATION_END_HOUR).contains(&hour) {
            PeriodWindow::Operation
        } else {
            PeriodWindow::OffHours
        }
    }

    pub fn classify(ts: PrimitiveDateTime) -> PeriodWindow {
        Self::at(ts.hour(), ts.weekday())
    }

    pub fn label(self) -> &'static str {
        match self {
            PeriodWindow::Operation => "Operation (08-21h)",
            PeriodWindow::OffHours => "Off hours (21-08h)",
            PeriodWindow::Weekend => "Weekend",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("start date {start} is after end date {end}")]
    Inverted { start: Date, end: Date },
}

/// Inclusive calendar date range selected for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn inclusive_days(&self) -> u64 {
        ((self.end - self.start).whole_days() + 1) as u64
    }

    /// Whole-day containment: every instant of the end date is inside.
    pub fn contains(&self, ts: PrimitiveDateTime) -> bool {
        let d = ts.date();
        d >= self.start && d <= self.end
    }
}
