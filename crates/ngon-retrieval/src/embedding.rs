use async_trait::async_trait;
use ngon_core::{NgonError, NgonResult};
use std::collections::HashMap;

/// Dimension of the packaged index artifacts.
pub const DEFAULT_DIMENSION: usize = 384;

/// Trait for turning text into a fixed-dimension vector.
///
/// The production provider is an external inference service; the engine only
/// depends on this trait.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute the embedding vector for `text`. Empty text is rejected with
    /// [`NgonError::InvalidInput`].
    async fn embed(&self, text: &str) -> NgonResult<Vec<f32>>;

    /// Dimension of the vectors this provider produces.
    fn dimension(&self) -> usize;
}

/// Deterministic in-process embedding: hashed bag-of-words, L2-normalized.
///
/// Not a real semantic model — it exists so the retrieval stack can run and
/// be tested without an inference service, and it is deterministic, which the
/// retriever's ordering guarantees rely on in tests.
pub struct HashEmbedding {
    dimension: usize,
}

impl HashEmbedding {
    /// Provider with an explicit dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, text: &str) -> NgonResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(NgonError::InvalidInput("cannot embed empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut freq: HashMap<&str, f32> = HashMap::new();
        for word in &words {
            *freq.entry(word).or_insert(0.0) += 1.0;
        }

        let total = words.len() as f32;
        if total == 0.0 {
            return Ok(vector);
        }

        // Three hash positions per word for better distribution.
        for (word, count) in &freq {
            let tf = count / total;
            let h1 = fnv1a(word.as_bytes()) as usize;
            let h2 = fnv1a(&[word.as_bytes(), &[1u8]].concat()) as usize;
            let h3 = fnv1a(&[word.as_bytes(), &[2u8]].concat()) as usize;

            vector[h1 % self.dimension] += tf;
            vector[h2 % self.dimension] += tf * 0.7;
            vector[h3 % self.dimension] += tf * 0.5;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn fnv1a(data: &[u8]) -> u32 {
    let mut hash: u32 = 2166136261;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// Cosine similarity between two vectors of equal length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dimension_and_normalization() {
        let emb = HashEmbedding::default();
        let vec = emb.embed("phở bò tái lăn").await.unwrap();
        assert_eq!(vec.len(), DEFAULT_DIMENSION);
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let emb = HashEmbedding::default();
        assert!(emb.embed("").await.is_err());
        assert!(emb.embed("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_deterministic() {
        let emb = HashEmbedding::default();
        let v1 = emb.embed("bún chả hà nội").await.unwrap();
        let v2 = emb.embed("bún chả hà nội").await.unwrap();
        assert_eq!(v1, v2);
    }

    #[tokio::test]
    async fn test_related_texts_score_higher() {
        let emb = HashEmbedding::default();
        let a = emb.embed("phở bò hà nội").await.unwrap();
        let b = emb.embed("phở gà hà nội").await.unwrap();
        let c = emb.embed("trà sữa trân châu").await.unwrap();
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }
}
