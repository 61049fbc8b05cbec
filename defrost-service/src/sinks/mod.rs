pub mod table;

pub use table::{CollectedRows, TableSink};
