use crate::sqlite::SqliteFoodStore;
use crate::store::FoodStore;
use ngon_core::{City, NgonResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Per-city store handles, opened lazily on first use.
///
/// Each city has its own [`OnceCell`], so concurrent first requests for the
/// same city collapse into a single open (single-flight) while different
/// cities open independently. A failed open is not cached; the next request
/// retries.
pub struct StoreRegistry {
    data_dir: PathBuf,
    cells: HashMap<City, OnceCell<Arc<dyn FoodStore>>>,
}

impl StoreRegistry {
    /// Registry over `<data_dir>/<city>/food.db` files.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cells: City::ALL
                .into_iter()
                .map(|city| (city, OnceCell::new()))
                .collect(),
        }
    }

    /// Registry with pre-seeded stores, for tests and demos.
    pub fn with_stores(stores: Vec<(City, Arc<dyn FoodStore>)>) -> Self {
        let mut cells: HashMap<City, OnceCell<Arc<dyn FoodStore>>> = City::ALL
            .into_iter()
            .map(|city| (city, OnceCell::new()))
            .collect();
        for (city, store) in stores {
            cells.insert(city, OnceCell::new_with(Some(store)));
        }
        Self {
            data_dir: PathBuf::new(),
            cells,
        }
    }

    /// Get (opening if needed) the store for `city`.
    pub async fn get(&self, city: City) -> NgonResult<Arc<dyn FoodStore>> {
        // Cells exist for every City variant, so the lookup cannot miss.
        let cell = &self.cells[&city];
        let store = cell
            .get_or_try_init(|| async {
                let path = self.data_dir.join(city.as_str()).join("food.db");
                let store = SqliteFoodStore::open(&path, city)?;
                info!(city = %city, path = %path.display(), "opened food store");
                Ok::<Arc<dyn FoodStore>, ngon_core::NgonError>(Arc::new(store))
            })
            .await?;
        Ok(Arc::clone(store))
    }
}
