//! Hybrid retrieval over per-city food data: exact name matching against a
//! read-only structured store fused with nearest-neighbor search over a
//! per-city vector index.
//!
//! # Main types
//!
//! - [`HybridRetriever`] — text / semantic / hybrid search with exact-first
//!   ordering and dedup.
//! - [`IndexManager`] — per-city lazy single-flight index loading.
//! - [`StoreRegistry`] / [`FoodStore`] — per-city structured stores.
//! - [`EmbeddingProvider`] — seam for the external embedding service.

/// Embedding provider seam and the in-process hash embedding.
pub mod embedding;
/// Hybrid retriever.
pub mod hybrid;
/// Vector index structure and artifact format.
pub mod index;
/// Per-city index loading and caching.
pub mod manager;
/// Per-city store registry.
pub mod registry;
/// SQLite store backend.
pub mod sqlite;
/// Structured store trait and in-memory backend.
pub mod store;

pub use embedding::{cosine_similarity, EmbeddingProvider, HashEmbedding, DEFAULT_DIMENSION};
pub use hybrid::{HybridRetriever, MatchKind, SearchHit, SearchMode};
pub use index::{IndexArtifact, VectorIndex};
pub use manager::IndexManager;
pub use registry::StoreRegistry;
pub use sqlite::SqliteFoodStore;
pub use store::{FoodStore, InMemoryFoodStore};
