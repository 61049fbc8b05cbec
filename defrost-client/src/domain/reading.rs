use std::collections::BTreeMap;

use time::PrimitiveDateTime;

use super::period::DateRange;

/// A single row of a zone export after timestamp coercion.
///
/// Cell values that could not be read as numbers are kept as `None`; how a
/// missing value is interpreted (forward fill, zero) is up to the consumer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Reading {
    pub ts: PrimitiveDateTime,
    pub zone: String,
    pub ambient_temp_c: Option<f64>,
    pub defrost_status: Option<f64>,
}

/// Which optional columns a zone export actually carried.
///
/// A column that is absent is different from a column whose cells are empty:
/// the former makes the related analysis unavailable for the zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ZoneColumns {
    pub ambient_temperature: bool,
    pub defrost_status: bool,
}

/// All readings of every loaded zone, ordered by timestamp.
#[derive(Debug, Clone, Default)]
pub struct ReadingTable {
    readings: Vec<Reading>,
    columns: BTreeMap<String, ZoneColumns>,
}

impl ReadingTable {
    /// Builds a table, sorting the readings ascending by timestamp.
    ///
    /// The sort is stable, so readings sharing a timestamp keep the order in
    /// which their sources were concatenated.
    pub fn new(mut readings: Vec<Reading>, columns: BTreeMap<String, ZoneColumns>) -> Self {
        readings.sort_by_key(|r| r.ts);
        Self { readings, columns }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn columns(&self, zone: &str) -> Option<ZoneColumns> {
        self.columns.get(zone).copied()
    }

    /// Names of the zones that contributed at least one source.
    pub fn zones(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// First and last calendar date present in the table.
    pub fn date_bounds(&self) -> Option<DateRange> {
        let first = self.readings.first()?;
        let last = self.readings.last()?;
        DateRange::new(first.ts.date(), last.ts.date()).ok()
    }
}
