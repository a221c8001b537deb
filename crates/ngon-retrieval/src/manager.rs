use crate::index::VectorIndex;
use ngon_core::{City, NgonError, NgonResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Owns one [`VectorIndex`] per city and serves nearest-neighbor lookups.
///
/// Indexes load lazily on first use; each city has its own [`OnceCell`] so
/// loading is single-flight per city while lookups against already-loaded
/// indexes proceed concurrently. `preload_all` loads everything up front so
/// no request pays the load cost.
pub struct IndexManager {
    data_dir: PathBuf,
    cells: HashMap<City, OnceCell<Arc<VectorIndex>>>,
}

impl IndexManager {
    /// Manager over `<data_dir>/<city>/index.json` artifacts.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cells: City::ALL
                .into_iter()
                .map(|city| (city, OnceCell::new()))
                .collect(),
        }
    }

    /// Manager with pre-built indexes, for tests.
    pub fn with_indexes(indexes: Vec<(City, VectorIndex)>) -> Self {
        let mut cells: HashMap<City, OnceCell<Arc<VectorIndex>>> = City::ALL
            .into_iter()
            .map(|city| (city, OnceCell::new()))
            .collect();
        for (city, index) in indexes {
            cells.insert(city, OnceCell::new_with(Some(Arc::new(index))));
        }
        Self {
            data_dir: PathBuf::new(),
            cells,
        }
    }

    /// Get (loading if needed) the index for `city`. A lazy-load failure is
    /// surfaced as [`NgonError::ServiceUnavailable`] for that city and is
    /// retried on the next call.
    pub async fn get_index(&self, city: City) -> NgonResult<Arc<VectorIndex>> {
        let cell = &self.cells[&city];
        let index = cell
            .get_or_try_init(|| async { self.load(city).await })
            .await
            .map_err(|e| match e {
                NgonError::Startup(msg) => NgonError::ServiceUnavailable(format!(
                    "index for {city} is unavailable: {msg}"
                )),
                other => other,
            })?;
        Ok(Arc::clone(index))
    }

    /// Eagerly load every city's index. A bad or missing artifact marks that
    /// city unavailable (it will be retried lazily) instead of failing the
    /// whole startup; the list of failed cities is returned so the caller
    /// can decide whether to treat that as fatal.
    pub async fn preload_all(&self) -> Vec<(City, NgonError)> {
        let mut failed = Vec::new();
        for city in City::ALL {
            let cell = &self.cells[&city];
            match cell.get_or_try_init(|| async { self.load(city).await }).await {
                Ok(index) => {
                    info!(city = %city, entries = index.len(), "preloaded vector index");
                }
                Err(e) => {
                    warn!(city = %city, error = %e, "could not preload vector index");
                    failed.push((city, e));
                }
            }
        }
        failed
    }

    /// Top-`k` (item id, similarity) pairs for `query_vector` in `city`.
    pub async fn nearest(
        &self,
        city: City,
        query_vector: &[f32],
        k: usize,
    ) -> NgonResult<Vec<(i64, f32)>> {
        let index = self.get_index(city).await?;
        index.nearest(query_vector, k)
    }

    async fn load(&self, city: City) -> NgonResult<Arc<VectorIndex>> {
        let path = self.data_dir.join(city.as_str()).join("index.json");
        let index = tokio::task::spawn_blocking(move || VectorIndex::load(&path))
            .await
            .map_err(|e| NgonError::Startup(format!("index load task panicked: {e}")))??;
        Ok(Arc::new(index))
    }
}
