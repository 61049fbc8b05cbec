use std::{path::PathBuf, sync::Arc};

use super::{load_all, LoadError, LoadedTable};
use crate::{config::ZoneConfig, sources::CsvOptions};

/// Identity of a load: every zone with its resolved path, plus the CSV
/// layout the files are read with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    sources: Vec<(String, PathBuf)>,
    options: CsvOptions,
}

impl CacheKey {
    pub fn resolve(zones: &[ZoneConfig], options: &CsvOptions) -> Self {
        let sources = zones
            .iter()
            .map(|z| {
                // A path that does not resolve (missing file) is keyed as given.
                let path = std::fs::canonicalize(&z.path).unwrap_or_else(|_| z.path.clone());
                (z.name.clone(), path)
            })
            .collect();

        Self {
            sources,
            options: options.clone(),
        }
    }
}

/// Memoizes the last successful load.
///
/// The cached table is reused as long as the resolved paths and CSV options
/// are unchanged; any change triggers a reload. Failed loads are not cached.
#[derive(Debug, Default)]
pub struct LoaderCache {
    entry: Option<(CacheKey, Arc<LoadedTable>)>,
}

impl LoaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_load(
        &mut self,
        zones: &[ZoneConfig],
        options: &CsvOptions,
    ) -> Result<Arc<LoadedTable>, LoadError> {
        let key = CacheKey::resolve(zones, options);

        if let Some((cached_key, table)) = &self.entry {
            if *cached_key == key {
                metrics::counter!("loader_cache_hits_total").increment(1);
                return Ok(Arc::clone(table));
            }
        }

        metrics::counter!("loader_cache_misses_total").increment(1);
        tracing::debug!(sources = key.sources.len(), "loading zone exports");

        let loaded = Arc::new(load_all(zones, options).await?);
        self.entry = Some((key, Arc::clone(&loaded)));
        Ok(loaded)
    }

    #[cfg(test)]
    pub fn is_cached(&self) -> bool {
        self.entry.is_some()
    }
}
