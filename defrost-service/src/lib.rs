pub mod config;
pub mod engine;
pub mod http;
pub mod loader;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use pipeline::{Envelope, Pipeline};
