use std::{pin::Pin, sync::Arc};

use futures::{Stream, StreamExt};

/// A record together with the line of the export it was read from.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub line: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The whole source is unusable.
    #[error("source error: {0}")]
    Source(String),
    /// A single record was dropped by the source; the stream goes on.
    #[error("record rejected: {0}")]
    Rejected(String),
    /// A single record was dropped by a transform; the stream goes on.
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
}

impl PipelineError {
    /// Whether the error only concerns one record.
    pub fn is_record_level(&self) -> bool {
        matches!(self, PipelineError::Rejected(_) | PipelineError::Transform(_))
    }
}

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(
        &self,
    ) -> Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    type Output: Send;

    async fn run<S>(&self, input: S) -> Result<Self::Output, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

pub struct Pipeline<S, T, K> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<T, T> + Send + Sync>>, // same-type transforms chain
    pub sink: K,
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + Send + Sync + 'static,
    K: Sink<T> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<K::Output, PipelineError> {
        let mut stream = self.source.stream().await;

        // Apply transforms in sequence (if any).
        for t in self.transforms {
            let t_arc = t.clone();
            stream = Box::pin(stream.then(move |item| {
                let t_inner = t_arc.clone();
                async move {
                    match item {
                        Ok(env) => t_inner.apply(env).await,
                        Err(e) => Err(e),
                    }
                }
            }));
        }

        self.sink.run(stream).await
    }
}
