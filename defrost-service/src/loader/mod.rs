//! Loading of zone exports into one time-ordered [`ReadingTable`].
//!
//! Each configured zone is read through its own pipeline. A zone whose file
//! is missing or malformed is skipped with a warning; only when no zone
//! yields a reading does loading fail as a whole.

pub mod cache;

use std::{collections::BTreeMap, fmt, path::PathBuf, sync::Arc};

use defrost_client::domain::{Reading, ReadingTable, ZoneColumns};

use crate::{
    config::ZoneConfig,
    pipeline::Pipeline,
    sinks::{CollectedRows, TableSink},
    sources::{CsvOptions, OpenError, ZoneCsvFileSource},
    transform::TimestampBoundsValidation,
};

pub use cache::LoaderCache;

/// Why a zone export contributed nothing to the table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The file could not be opened.
    Unavailable { message: String },
    /// The file could be opened but not read as CSV.
    Unreadable { message: String },
    /// No header or no data rows.
    Empty,
    MissingTimestampColumn,
    /// Rows exist but none carried a parseable timestamp.
    NoValidTimestamps { rejected: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unavailable { message } => write!(f, "file not available ({message})"),
            SkipReason::Unreadable { message } => write!(f, "file could not be read ({message})"),
            SkipReason::Empty => write!(f, "file is empty"),
            SkipReason::MissingTimestampColumn => write!(f, "date/time column not found"),
            SkipReason::NoValidTimestamps { rejected } => {
                write!(f, "no valid date found ({rejected} rows rejected)")
            }
        }
    }
}

impl From<OpenError> for SkipReason {
    fn from(e: OpenError) -> Self {
        match e {
            OpenError::Io { .. } => SkipReason::Unavailable { message: e.to_string() },
            OpenError::Csv(_) => SkipReason::Unreadable { message: e.to_string() },
            OpenError::Empty => SkipReason::Empty,
            OpenError::MissingTimestampColumn => SkipReason::MissingTimestampColumn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SkippedSource {
    pub zone: String,
    pub path: PathBuf,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.zone, self.path.display(), self.reason)
    }
}

/// Outcome of a successful load: the table plus the sources left out of it.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: ReadingTable,
    pub skipped: Vec<SkippedSource>,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("no data file could be loaded ({} sources skipped)", skipped.len())]
    NoData { skipped: Vec<SkippedSource> },
}

async fn load_zone(
    zone: &ZoneConfig,
    options: &CsvOptions,
) -> Result<(CollectedRows, ZoneColumns), SkipReason> {
    let source = ZoneCsvFileSource::open(&zone.name, &zone.path, options)?;
    let columns = source.columns();

    let pipeline: Pipeline<_, Reading, _> = Pipeline {
        source,
        transforms: vec![Arc::new(TimestampBoundsValidation)],
        sink: TableSink,
    };
    let rows = pipeline
        .run()
        .await
        .map_err(|e| SkipReason::Unreadable { message: e.to_string() })?;

    if rows.readings.is_empty() {
        return Err(if rows.rejected == 0 {
            SkipReason::Empty
        } else {
            SkipReason::NoValidTimestamps { rejected: rows.rejected }
        });
    }

    Ok((rows, columns))
}

/// Loads every configured zone and concatenates them into one sorted table.
pub async fn load_all(zones: &[ZoneConfig], options: &CsvOptions) -> Result<LoadedTable, LoadError> {
    let mut readings = Vec::new();
    let mut columns = BTreeMap::new();
    let mut skipped = Vec::new();

    for zone in zones {
        match load_zone(zone, options).await {
            Ok((rows, zone_columns)) => {
                tracing::info!(
                    zone = %zone.name,
                    rows = rows.readings.len(),
                    rejected = rows.rejected,
                    "zone export loaded"
                );
                readings.extend(rows.readings);
                columns.insert(zone.name.clone(), zone_columns);
            }
            Err(reason) => {
                tracing::warn!(
                    zone = %zone.name,
                    path = %zone.path.display(),
                    reason = %reason,
                    "skipping zone export"
                );
                metrics::counter!("loader_sources_skipped_total").increment(1);
                skipped.push(SkippedSource {
                    zone: zone.name.clone(),
                    path: zone.path.clone(),
                    reason,
                });
            }
        }
    }

    if readings.is_empty() {
        tracing::error!(skipped = skipped.len(), "no zone export yielded data");
        return Err(LoadError::NoData { skipped });
    }

    Ok(LoadedTable {
        table: ReadingTable::new(readings, columns),
        skipped,
    })
}
