use defrost_client::domain::Reading;
use futures::StreamExt;

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Rows accepted from one source, plus how many were dropped on the way.
#[derive(Debug, Default)]
pub struct CollectedRows {
    pub readings: Vec<Reading>,
    pub rejected: usize,
}

/// Collects a zone stream in memory.
///
/// Record-level errors are counted and skipped; a source-level error aborts
/// the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableSink;

#[async_trait::async_trait]
impl Sink<Reading> for TableSink {
    type Output = CollectedRows;

    async fn run<S>(&self, mut input: S) -> Result<CollectedRows, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<Reading>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut out = CollectedRows::default();

        while let Some(item) = input.next().await {
            match item {
                Ok(env) => out.readings.push(env.payload),
                Err(e) if e.is_record_level() => {
                    tracing::debug!(error = %e, "dropping row");
                    out.rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(out)
    }
}
