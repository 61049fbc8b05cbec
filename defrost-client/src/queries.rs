use crate::domain::{DateRange, Reading, ReadingTable, ZoneColumns};

/// Readings of one zone inside a date range, in timestamp order.
#[derive(Debug, Clone)]
pub struct ZoneSeries<'a> {
    pub zone: &'a str,
    pub columns: ZoneColumns,
    pub readings: Vec<&'a Reading>,
}

impl<'a> ZoneSeries<'a> {
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }
}

/// Fetch the time-ordered profile of a single zone.
///
/// An unknown zone yields an empty series with no columns.
pub fn zone_series<'a>(table: &'a ReadingTable, zone: &'a str, range: DateRange) -> ZoneSeries<'a> {
    let readings = table
        .readings()
        .iter()
        .filter(|r| r.zone == zone && range.contains(r.ts))
        .collect();

    ZoneSeries {
        zone,
        columns: table.columns(zone).unwrap_or_default(),
        readings,
    }
}
