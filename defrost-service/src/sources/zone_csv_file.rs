use std::{
    borrow::Cow,
    fs::File,
    path::{Path, PathBuf},
};

use csv::{ByteRecord, StringRecord};
use defrost_client::domain::{Reading, ZoneColumns};
use futures::Stream;

use super::timestamp::parse_day_first;
use crate::pipeline::{Envelope, PipelineError, Source};

/// How zone exports are laid out on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub defrost_status_column: String,
    pub ambient_temperature_column: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            defrost_status_column: "Defrost Status ()".to_string(),
            ambient_temperature_column: "Ambient Temperature (°C)".to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum OpenError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read CSV header: {0}")]
    Csv(#[from] csv::Error),
    #[error("file is empty")]
    Empty,
    #[error("no date/time column found")]
    MissingTimestampColumn,
}

/// First column whose name mentions a date ("Data") or an hour ("Hora").
pub fn find_timestamp_column<'a, I>(columns: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    columns
        .into_iter()
        .find(|c| c.contains("Data") || c.contains("Hora"))
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub timestamp: usize,
    pub ambient_temperature: Option<usize>,
    pub defrost_status: Option<usize>,
}

impl ColumnLayout {
    pub fn resolve(headers: &StringRecord, options: &CsvOptions) -> Result<Self, OpenError> {
        if headers.iter().all(|h| h.is_empty()) {
            return Err(OpenError::Empty);
        }

        let ts_name = find_timestamp_column(headers.iter()).ok_or(OpenError::MissingTimestampColumn)?;
        let position = |name: &str| headers.iter().position(|h| h == name);

        Ok(Self {
            // The name was found in the same header row.
            timestamp: position(ts_name).unwrap_or_default(),
            ambient_temperature: position(&options.ambient_temperature_column),
            defrost_status: position(&options.defrost_status_column),
        })
    }

    pub fn zone_columns(&self) -> ZoneColumns {
        ZoneColumns {
            ambient_temperature: self.ambient_temperature.is_some(),
            defrost_status: self.defrost_status.is_some(),
        }
    }
}

/// Reads a numeric cell. Empty or non-numeric cells are missing values.
///
/// A decimal comma is accepted (`-19,5`).
pub fn parse_optional_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replacen(',', ".", 1).parse::<f64>().ok())
        .filter(|v| !v.is_nan())
}

/// Decodes a cell as UTF-8, falling back to Windows-1252 for exports saved
/// by spreadsheet tools in the legacy code page (`°C` as a single `0xB0`).
fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes).0,
    }
}

fn decode_record(record: &ByteRecord) -> StringRecord {
    record.iter().map(decode_field).collect()
}

fn reader_for(file: File, delimiter: u8) -> csv::Reader<File> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file)
}

fn open_file(path: &Path) -> Result<File, OpenError> {
    File::open(path).map_err(|source| OpenError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Zone export source producing [`Reading`]s.
///
/// The header row is checked when the source is opened, so a file without a
/// usable timestamp column never reaches the pipeline. Rows whose timestamp
/// cannot be parsed are emitted as [`PipelineError::Rejected`] and the stream
/// continues.
pub struct ZoneCsvFileSource {
    zone: String,
    path: PathBuf,
    delimiter: u8,
    layout: ColumnLayout,
}

impl ZoneCsvFileSource {
    pub fn open<P: Into<PathBuf>>(
        zone: impl Into<String>,
        path: P,
        options: &CsvOptions,
    ) -> Result<Self, OpenError> {
        let path = path.into();
        let mut rdr = reader_for(open_file(&path)?, options.delimiter);
        let headers = decode_record(rdr.byte_headers()?);
        let layout = ColumnLayout::resolve(&headers, options)?;

        Ok(Self {
            zone: zone.into(),
            path,
            delimiter: options.delimiter,
            layout,
        })
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    pub fn columns(&self) -> ZoneColumns {
        self.layout.zone_columns()
    }
}

fn record_to_reading(
    record: &StringRecord,
    layout: &ColumnLayout,
    zone: &str,
    line: u64,
) -> Result<Reading, PipelineError> {
    let ts_str = record.get(layout.timestamp).unwrap_or("");
    let ts = parse_day_first(ts_str)
        .ok_or_else(|| PipelineError::Rejected(format!("line {line}: invalid timestamp '{ts_str}'")))?;

    let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).and_then(parse_optional_f64);

    Ok(Reading {
        ts,
        zone: zone.to_string(),
        ambient_temp_c: cell(layout.ambient_temperature),
        defrost_status: cell(layout.defrost_status),
    })
}

#[async_trait::async_trait]
impl Source<Reading> for ZoneCsvFileSource {
    async fn stream(
        &self,
    ) -> std::pin::Pin<Box<dyn Stream<Item = Result<Envelope<Reading>, PipelineError>> + Send>> {
        // Blocking CSV reader inside a single task; exports are small.
        let path = self.path.clone();
        let zone = self.zone.clone();
        let layout = self.layout;
        let delimiter = self.delimiter;

        let s = async_stream::stream! {
            let file = match open_file(&path) {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::Source(e.to_string()));
                    return;
                }
            };
            let mut rdr = reader_for(file, delimiter);

            for result in rdr.byte_records() {
                let record = match result {
                    Ok(r) => r,
                    Err(e) => {
                        yield Err(PipelineError::Source(format!("failed to read CSV record: {e}")));
                        return;
                    }
                };
                let line = record.position().map(|p| p.line()).unwrap_or_default();

                match record_to_reading(&decode_record(&record), &layout, &zone, line) {
                    Ok(reading) => yield Ok(Envelope { payload: reading, line }),
                    Err(e) => {
                        metrics::counter!("zone_csv_rejected_rows_total").increment(1);
                        yield Err(e);
                    }
                }
            }
        };

        Box::pin(s)
    }
}
