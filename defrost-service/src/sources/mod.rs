pub mod timestamp;
pub mod zone_csv_file;

pub use timestamp::parse_day_first;
pub use zone_csv_file::{find_timestamp_column, ColumnLayout, CsvOptions, OpenError, ZoneCsvFileSource};
