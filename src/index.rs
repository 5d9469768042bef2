use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::errors::KindredError;

#[derive(Debug, Clone)]
struct IndexEntry {
    vector: Vec<f32>,
    display_name: String,
}

/// In-memory nearest-neighbor index over user interest vectors.
///
/// Process-lifetime derived cache, rebuilt from storage on startup. Owns its
/// own lock; one index-wide RwLock is enough at the expected cardinality.
/// Queries are a brute-force O(N * D) scan by design.
#[derive(Debug)]
pub struct SimilarityIndex {
    dim: usize,
    entries: RwLock<BTreeMap<u32, IndexEntry>>,
}

impl SimilarityIndex {
    /// Create an empty index for vectors of the given dimensionality.
    pub fn new(dim: usize) -> Self {
        SimilarityIndex {
            dim,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> Result<usize, KindredError> {
        Ok(self.entries.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, KindredError> {
        Ok(self.entries.read()?.is_empty())
    }

    fn check_dim(&self, vector: &[f32]) -> Result<(), KindredError> {
        if vector.len() != self.dim {
            return Err(KindredError::DimensionMismatch {
                expected: self.dim,
                found: vector.len(),
            });
        }
        Ok(())
    }

    /// Insert or fully replace the entry for `user_id`.
    pub fn upsert(
        &self,
        user_id: u32,
        vector: Vec<f32>,
        display_name: &str,
    ) -> Result<(), KindredError> {
        self.check_dim(&vector)?;

        let mut entries = self.entries.write()?;
        entries.insert(
            user_id,
            IndexEntry {
                vector,
                display_name: display_name.to_string(),
            },
        );

        Ok(())
    }

    /// Remove the entry for `user_id`. Idempotent; absent ids are a no-op.
    pub fn remove(&self, user_id: u32) -> Result<(), KindredError> {
        let mut entries = self.entries.write()?;
        entries.remove(&user_id);
        Ok(())
    }

    pub fn contains(&self, user_id: u32) -> Result<bool, KindredError> {
        Ok(self.entries.read()?.contains_key(&user_id))
    }

    pub fn display_name(&self, user_id: u32) -> Result<Option<String>, KindredError> {
        Ok(self
            .entries
            .read()?
            .get(&user_id)
            .map(|e| e.display_name.clone()))
    }

    pub fn vector(&self, user_id: u32) -> Result<Option<Vec<f32>>, KindredError> {
        Ok(self.entries.read()?.get(&user_id).map(|e| e.vector.clone()))
    }

    /// Top `n` user ids by descending cosine similarity to `query`.
    ///
    /// Ties break by ascending user id so results are deterministic.
    /// `exclude_user_id` is omitted even when it is the closest match. An
    /// empty index yields an empty list, never an error.
    pub fn top_n_similar(
        &self,
        query: &[f32],
        n: usize,
        exclude_user_id: Option<u32>,
    ) -> Result<Vec<u32>, KindredError> {
        self.check_dim(query)?;

        let entries = self.entries.read()?;
        let mut scored: Vec<(u32, f32)> = entries
            .iter()
            .filter(|(id, _)| Some(**id) != exclude_user_id)
            .map(|(id, entry)| (*id, cosine_similarity(query, &entry.vector)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(n);

        Ok(scored.into_iter().map(|(id, _)| id).collect())
    }

    /// Copy of all vectors, taken under the read lock. Used to feed
    /// clustering without holding the lock during the computation.
    pub fn snapshot(&self) -> Result<HashMap<u32, Vec<f32>>, KindredError> {
        Ok(self
            .entries
            .read()?
            .iter()
            .map(|(id, entry)| (*id, entry.vector.clone()))
            .collect())
    }
}

/// Cosine similarity with the zero-vector convention: if either vector has
/// zero norm the result is 0.0, never NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
