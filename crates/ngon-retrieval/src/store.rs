use async_trait::async_trait;
use ngon_core::{FoodItem, NgonResult};
use parking_lot::RwLock;

/// Read-only access to one city's structured food data.
///
/// Implementations must be safe for concurrent lookups; nothing here
/// mutates the underlying data.
#[async_trait]
pub trait FoodStore: Send + Sync + std::fmt::Debug {
    /// Fetch items by id, preserving the order of `ids`. Unknown ids are
    /// silently skipped (the vector index may be slightly ahead of a
    /// rebuilt store).
    async fn lookup_by_ids(&self, ids: &[i64]) -> NgonResult<Vec<FoodItem>>;

    /// Case-insensitive substring match over restaurant and dish names.
    /// Returns at most `limit` candidates; ranking happens in the retriever.
    async fn search_by_name(&self, keyword: &str, limit: usize) -> NgonResult<Vec<FoodItem>>;

    /// Number of items in the store.
    async fn count(&self) -> NgonResult<usize>;
}

/// In-memory store for tests and demos.
#[derive(Debug)]
pub struct InMemoryFoodStore {
    items: RwLock<Vec<FoodItem>>,
}

impl InMemoryFoodStore {
    /// Build a store over a fixed item list.
    pub fn new(items: Vec<FoodItem>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }
}

#[async_trait]
impl FoodStore for InMemoryFoodStore {
    async fn lookup_by_ids(&self, ids: &[i64]) -> NgonResult<Vec<FoodItem>> {
        let items = self.items.read();
        let found: Vec<FoodItem> = ids
            .iter()
            .filter_map(|id| items.iter().find(|item| item.id == *id).cloned())
            .collect();
        Ok(found)
    }

    async fn search_by_name(&self, keyword: &str, limit: usize) -> NgonResult<Vec<FoodItem>> {
        let needle = keyword.to_lowercase();
        let items = self.items.read();
        let found: Vec<FoodItem> = items
            .iter()
            .filter(|item| {
                item.name.to_lowercase().contains(&needle)
                    || item.dish.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect();
        Ok(found)
    }

    async fn count(&self) -> NgonResult<usize> {
        Ok(self.items.read().len())
    }
}
