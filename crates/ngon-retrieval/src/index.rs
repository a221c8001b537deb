use crate::embedding::cosine_similarity;
use ngon_core::{NgonError, NgonResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk shape of a per-city index artifact (`index.json`), produced by
/// the offline pack builder.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexArtifact {
    /// Embedding dimension every vector must match.
    pub dimension: usize,
    /// Item id for each row; `ids[i]` owns `vectors[i]`.
    pub ids: Vec<i64>,
    /// Row vectors.
    pub vectors: Vec<Vec<f32>>,
}

/// Immutable nearest-neighbor structure over one city's item embeddings.
///
/// Row `i` corresponds 1:1 to item id `ids[i]`; both lengths are validated
/// at load. There is no insert/delete — a rebuild replaces the whole file.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    ids: Vec<i64>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Validate and take ownership of an artifact.
    pub fn from_artifact(artifact: IndexArtifact) -> NgonResult<Self> {
        if artifact.ids.len() != artifact.vectors.len() {
            return Err(NgonError::Startup(format!(
                "index id mapping mismatch: {} ids vs {} vectors",
                artifact.ids.len(),
                artifact.vectors.len()
            )));
        }
        if let Some(bad) = artifact
            .vectors
            .iter()
            .position(|v| v.len() != artifact.dimension)
        {
            return Err(NgonError::Startup(format!(
                "index row {bad} has dimension {} (expected {})",
                artifact.vectors[bad].len(),
                artifact.dimension
            )));
        }
        Ok(Self {
            dimension: artifact.dimension,
            ids: artifact.ids,
            vectors: artifact.vectors,
        })
    }

    /// Load and validate an artifact file. Any problem — missing file, bad
    /// JSON, mapping mismatch — is a [`NgonError::Startup`].
    pub fn load(path: &Path) -> NgonResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            NgonError::Startup(format!("cannot open index {}: {e}", path.display()))
        })?;
        let artifact: IndexArtifact = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| {
                NgonError::Startup(format!("cannot parse index {}: {e}", path.display()))
            })?;
        Self::from_artifact(artifact)
    }

    /// Number of indexed rows.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when the index holds no rows.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Item id for row `i`, if in range.
    pub fn id_at(&self, i: usize) -> Option<i64> {
        self.ids.get(i).copied()
    }

    /// Top-`k` rows by cosine similarity to `query`, descending; ties broken
    /// by ascending item id so results are stable across runs.
    pub fn nearest(&self, query: &[f32], k: usize) -> NgonResult<Vec<(i64, f32)>> {
        if query.len() != self.dimension {
            return Err(NgonError::InvalidInput(format!(
                "query vector dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(i64, f32)> = self
            .ids
            .iter()
            .zip(self.vectors.iter())
            .map(|(id, vec)| (*id, cosine_similarity(query, vec)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn artifact() -> IndexArtifact {
        IndexArtifact {
            dimension: 3,
            ids: vec![10, 20, 30],
            vectors: vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.9, 0.1, 0.0],
            ],
        }
    }

    #[test]
    fn test_mapping_length_mismatch_is_startup_error() {
        let mut bad = artifact();
        bad.ids.pop();
        let err = VectorIndex::from_artifact(bad).unwrap_err();
        assert!(matches!(err, NgonError::Startup(_)));
    }

    #[test]
    fn test_dimension_mismatch_is_startup_error() {
        let mut bad = artifact();
        bad.vectors[1] = vec![0.0, 1.0];
        let err = VectorIndex::from_artifact(bad).unwrap_err();
        assert!(matches!(err, NgonError::Startup(_)));
    }

    #[test]
    fn test_nearest_orders_by_similarity() {
        let index = VectorIndex::from_artifact(artifact()).unwrap();
        let hits = index.nearest(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, 10);
        assert_eq!(hits[1].0, 30);
        assert!(hits[0].1 >= hits[1].1);
    }

    #[test]
    fn test_nearest_rejects_wrong_dimension() {
        let index = VectorIndex::from_artifact(artifact()).unwrap();
        let err = index.nearest(&[1.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, NgonError::InvalidInput(_)));
    }

    #[test]
    fn test_id_mapping_round_trip() {
        let index = VectorIndex::from_artifact(artifact()).unwrap();
        assert_eq!(index.len(), 3);
        for i in 0..index.len() {
            assert!(index.id_at(i).is_some());
        }
        assert_eq!(index.id_at(3), None);
    }

    #[test]
    fn test_load_missing_file_is_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorIndex::load(&dir.path().join("index.json")).unwrap_err();
        assert!(matches!(err, NgonError::Startup(_)));
    }

    #[test]
    fn test_load_valid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, serde_json::to_vec(&artifact()).unwrap()).unwrap();
        let index = VectorIndex::load(&path).unwrap();
        assert_eq!(index.dimension(), 3);
        assert_eq!(index.len(), 3);
    }
}
