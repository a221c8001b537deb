//! Integration tests for the hybrid retriever: ordering, dedup, fallback,
//! and the error contract for bad inputs.

use ngon_core::{City, FoodItem, NgonError};
use ngon_retrieval::{
    EmbeddingProvider, FoodStore, HashEmbedding, HybridRetriever, IndexArtifact, IndexManager,
    InMemoryFoodStore, MatchKind, SearchMode, StoreRegistry, VectorIndex,
};
use std::sync::Arc;

fn item(id: i64, name: &str, dish: &str, note: &str) -> FoodItem {
    FoodItem {
        id,
        name: name.to_string(),
        dish: dish.to_string(),
        address: format!("{id} Phố Huế"),
        district: "Hai Bà Trưng".to_string(),
        city: "ha_noi".to_string(),
        price_min: 30_000,
        price_max: 55_000,
        note: note.to_string(),
    }
}

fn corpus() -> Vec<FoodItem> {
    vec![
        item(1, "Phở Thìn", "Phở bò tái lăn", "phở bò truyền thống nước béo"),
        item(2, "Bún Chả Hương Liên", "Bún chả", "bún chả than hoa"),
        item(3, "Xôi Yến", "Xôi xéo", "xôi sáng nóng hổi"),
        item(4, "Quán Gà Ta", "Phở gà", "phở gà ta thơm ngon"),
        item(5, "Bánh Mì 25", "Bánh mì pate", "bánh mì giòn"),
    ]
}

async fn build_retriever() -> HybridRetriever {
    let embedder = Arc::new(HashEmbedding::default());
    let items = corpus();

    let mut ids = Vec::new();
    let mut vectors = Vec::new();
    for food in &items {
        let text = format!("{} {} {}", food.name, food.dish, food.note);
        ids.push(food.id);
        vectors.push(embedder.embed(&text).await.unwrap());
    }
    let index = VectorIndex::from_artifact(IndexArtifact {
        dimension: embedder.dimension(),
        ids,
        vectors,
    })
    .unwrap();

    let store: Arc<dyn FoodStore> = Arc::new(InMemoryFoodStore::new(items));
    HybridRetriever::new(
        Arc::new(StoreRegistry::with_stores(vec![(City::HaNoi, store)])),
        Arc::new(IndexManager::with_indexes(vec![(City::HaNoi, index)])),
        embedder,
    )
}

#[tokio::test]
async fn test_unknown_city_is_not_found() {
    let retriever = build_retriever().await;
    let err = retriever
        .search("xyz", "phở", 5, SearchMode::Hybrid)
        .await
        .unwrap_err();
    assert!(matches!(err, NgonError::NotFound(_)));
}

#[tokio::test]
async fn test_empty_query_is_invalid_in_every_mode() {
    let retriever = build_retriever().await;
    for mode in [SearchMode::Text, SearchMode::Semantic, SearchMode::Hybrid] {
        let err = retriever.search("ha_noi", "  ", 5, mode).await.unwrap_err();
        assert!(matches!(err, NgonError::InvalidInput(_)), "mode {mode:?}");
    }
}

#[tokio::test]
async fn test_exact_matches_rank_first_in_hybrid() {
    let retriever = build_retriever().await;
    let hits = retriever
        .search("ha_noi", "phở", 5, SearchMode::Hybrid)
        .await
        .unwrap();

    assert!(!hits.is_empty());
    assert_eq!(hits[0].kind, MatchKind::Exact);
    // Exact hits form a prefix of the result list.
    let first_semantic = hits.iter().position(|h| h.kind == MatchKind::Semantic);
    if let Some(pos) = first_semantic {
        assert!(hits[pos..].iter().all(|h| h.kind == MatchKind::Semantic));
    }
}

#[tokio::test]
async fn test_no_duplicates_and_size_bound() {
    let retriever = build_retriever().await;
    for top_k in [1, 2, 3, 10] {
        let hits = retriever
            .search("ha_noi", "phở", top_k, SearchMode::Hybrid)
            .await
            .unwrap();
        assert!(hits.len() <= top_k);
        let mut ids: Vec<i64> = hits.iter().map(|h| h.item.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), hits.len(), "duplicate ids at top_k={top_k}");
    }
}

#[tokio::test]
async fn test_stable_ordering_for_identical_inputs() {
    let retriever = build_retriever().await;
    let first = retriever
        .search("ha_noi", "phở", 5, SearchMode::Hybrid)
        .await
        .unwrap();
    let second = retriever
        .search("ha_noi", "phở", 5, SearchMode::Hybrid)
        .await
        .unwrap();
    let ids_a: Vec<i64> = first.iter().map(|h| h.item.id).collect();
    let ids_b: Vec<i64> = second.iter().map(|h| h.item.id).collect();
    assert_eq!(ids_a, ids_b);
}

#[tokio::test]
async fn test_text_specificity_ordering() {
    let retriever = build_retriever().await;
    let hits = retriever
        .search("ha_noi", "bún chả", 5, SearchMode::Text)
        .await
        .unwrap();
    // "Bún chả" (full dish match) must outrank the prefix-matching
    // restaurant name.
    assert_eq!(hits[0].item.id, 2);
}

#[tokio::test]
async fn test_semantic_fallback_when_text_finds_nothing() {
    let retriever = build_retriever().await;
    // No name or dish contains this phrasing, but the note text does share
    // tokens with the phở entries.
    let hits = retriever
        .search("ha_noi", "nước béo truyền thống", 3, SearchMode::Hybrid)
        .await
        .unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.kind == MatchKind::Semantic));
}

#[tokio::test]
async fn test_semantic_mode_resolves_valid_items() {
    let retriever = build_retriever().await;
    let hits = retriever
        .search("ha_noi", "phở bò", 5, SearchMode::Semantic)
        .await
        .unwrap();
    assert!(!hits.is_empty());
    for hit in &hits {
        assert!(corpus().iter().any(|c| c.id == hit.item.id));
        assert_eq!(hit.kind, MatchKind::Semantic);
    }
    // Scores descend.
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_city_without_store_is_unavailable() {
    let retriever = build_retriever().await;
    let err = retriever
        .search("da_nang", "phở", 5, SearchMode::Text)
        .await
        .unwrap_err();
    assert!(matches!(err, NgonError::ServiceUnavailable(_)));
}
