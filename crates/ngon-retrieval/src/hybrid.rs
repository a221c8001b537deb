use crate::embedding::EmbeddingProvider;
use crate::manager::IndexManager;
use crate::registry::StoreRegistry;
use ngon_core::{City, FoodItem, NgonError, NgonResult};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// How a query should be matched against a city's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Name/dish substring matching only.
    Text,
    /// Vector-similarity matching only.
    Semantic,
    /// Text first, semantic to fill the remainder.
    #[default]
    Hybrid,
}

/// Whether a hit came from exact matching or the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Name or dish contained the query keyword.
    Exact,
    /// Nearest neighbor in embedding space.
    Semantic,
}

/// One ranked retrieval result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The retrieved item.
    pub item: FoodItem,
    /// Match specificity (text) or cosine similarity (semantic).
    pub score: f32,
    /// Which leg produced this hit.
    pub kind: MatchKind,
}

// Text-match specificity scores: full name match beats a prefix match
// beats a bare substring match.
const SCORE_FULL: f32 = 1.0;
const SCORE_PREFIX: f32 = 0.75;
const SCORE_SUBSTRING: f32 = 0.5;

/// Fuses exact keyword lookup with per-city vector search.
///
/// Guarantees for every mode: at most `top_k` hits, no duplicate item ids,
/// stable ordering for identical inputs, and — whenever any exact match
/// exists — exact hits strictly before semantic ones.
pub struct HybridRetriever {
    stores: Arc<StoreRegistry>,
    indexes: Arc<IndexManager>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl HybridRetriever {
    /// Assemble a retriever from its three collaborators.
    pub fn new(
        stores: Arc<StoreRegistry>,
        indexes: Arc<IndexManager>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            stores,
            indexes,
            embedder,
        }
    }

    /// Search `city` for `query`. Unknown city → [`NgonError::NotFound`];
    /// empty query → [`NgonError::InvalidInput`] (in every mode — the
    /// embedding provider rejects empty text, so semantic mode cannot
    /// degrade to "most representative" results).
    pub async fn search(
        &self,
        city: &str,
        query: &str,
        top_k: usize,
        mode: SearchMode,
    ) -> NgonResult<Vec<SearchHit>> {
        let city = City::parse(city)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(NgonError::InvalidInput("empty query".to_string()));
        }

        match mode {
            SearchMode::Text => self.text_search(city, query, top_k).await,
            SearchMode::Semantic => self.semantic_search(city, query, top_k).await,
            SearchMode::Hybrid => self.hybrid_search(city, query, top_k).await,
        }
    }

    /// Exact/substring matching, ranked full > prefix > substring with
    /// ascending-id tie break.
    async fn text_search(
        &self,
        city: City,
        keyword: &str,
        top_k: usize,
    ) -> NgonResult<Vec<SearchHit>> {
        let store = self.stores.get(city).await?;
        // Over-fetch so specificity ranking sees more candidates than the
        // store's arbitrary LIMIT order would surface.
        let candidates = store.search_by_name(keyword, top_k.max(1) * 3).await?;

        let needle = keyword.to_lowercase();
        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .map(|item| {
                let score = text_specificity(&item, &needle);
                SearchHit {
                    item,
                    score,
                    kind: MatchKind::Exact,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Vector-similarity matching through the city's index, with neighbor
    /// ids resolved back to items via the structured store.
    async fn semantic_search(
        &self,
        city: City,
        query: &str,
        top_k: usize,
    ) -> NgonResult<Vec<SearchHit>> {
        let vector = self.embedder.embed(query).await?;
        let neighbors = self.indexes.nearest(city, &vector, top_k).await?;

        let ids: Vec<i64> = neighbors.iter().map(|(id, _)| *id).collect();
        let store = self.stores.get(city).await?;
        let items = store.lookup_by_ids(&ids).await?;

        // lookup_by_ids preserves neighbor order; re-attach scores by id in
        // case the store skipped a stale id.
        let hits = items
            .into_iter()
            .map(|item| {
                let score = neighbors
                    .iter()
                    .find(|(id, _)| *id == item.id)
                    .map_or(0.0, |(_, s)| *s);
                SearchHit {
                    item,
                    score,
                    kind: MatchKind::Semantic,
                }
            })
            .collect();
        Ok(hits)
    }

    /// Text first; semantic only pads the remainder (exact matches always
    /// outrank semantic ones). Full semantic fallback when text finds
    /// nothing; text-only degradation when the semantic leg fails.
    async fn hybrid_search(
        &self,
        city: City,
        query: &str,
        top_k: usize,
    ) -> NgonResult<Vec<SearchHit>> {
        let text_hits = self.text_search(city, query, top_k).await?;

        if text_hits.is_empty() {
            debug!(city = %city, query, "no text matches, falling back to semantic");
            return self.semantic_search(city, query, top_k).await;
        }
        if text_hits.len() >= top_k {
            return Ok(text_hits);
        }

        let semantic_hits = match self.semantic_search(city, query, top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(city = %city, error = %e, "semantic leg failed, degrading to text-only");
                return Ok(text_hits);
            }
        };

        let mut seen: HashSet<i64> = text_hits.iter().map(|h| h.item.id).collect();
        let mut merged = text_hits;
        for hit in semantic_hits {
            if merged.len() >= top_k {
                break;
            }
            if seen.insert(hit.item.id) {
                merged.push(hit);
            }
        }
        Ok(merged)
    }
}

fn text_specificity(item: &FoodItem, needle: &str) -> f32 {
    let fields = [item.name.to_lowercase(), item.dish.to_lowercase()];
    fields
        .iter()
        .map(|field| {
            if field == needle {
                SCORE_FULL
            } else if field.starts_with(needle) {
                SCORE_PREFIX
            } else if field.contains(needle) {
                SCORE_SUBSTRING
            } else {
                0.0
            }
        })
        .fold(0.0, f32::max)
}
