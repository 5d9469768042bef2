use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rocksdb::DB;
use tracing::debug;

use crate::cluster::{compute_clusters, same_cluster};
use crate::data::record::{InterestRecord, RATING_MAX, RATING_MIN};
use crate::errors::KindredError;
use crate::extract::extract_interest;
use crate::index::SimilarityIndex;
use crate::schema::InterestSchema;

/// Orchestrates profile updates and neighbor queries.
///
/// Update order matters: the merged record is persisted before the index is
/// touched, so the index never reflects ratings that did not durably land.
/// The cluster assignment is cached and recomputed lazily on the next
/// cluster query; membership may therefore be one update stale.
pub struct Pipeline {
    db: Arc<DB>,
    index: Arc<SimilarityIndex>,
    schema: Arc<InterestSchema>,
    clusters: usize,
    kmeans_seed: u64,
    cluster_cache: RwLock<Option<HashMap<u32, usize>>>,
}

impl Pipeline {
    pub fn new(
        db: Arc<DB>,
        index: Arc<SimilarityIndex>,
        schema: Arc<InterestSchema>,
        clusters: usize,
        kmeans_seed: u64,
    ) -> Self {
        Pipeline {
            db,
            index,
            schema,
            clusters,
            kmeans_seed,
            cluster_cache: RwLock::new(None),
        }
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn schema(&self) -> &InterestSchema {
        &self.schema
    }

    /// Apply a partial ratings update for one user.
    ///
    /// Merges into the durable record, persists, rebuilds the vector from
    /// the merged record and upserts it. A storage failure aborts before
    /// any index mutation.
    pub fn update_profile(
        &self,
        user_id: u32,
        display_name: &str,
        updates: &HashMap<String, f32>,
    ) -> Result<(), KindredError> {
        let mut record = match InterestRecord::load(&self.db, user_id) {
            Ok(record) => record,
            Err(KindredError::UserNotFound) => InterestRecord::new(display_name),
            Err(e) => return Err(e),
        };
        record.display_name = display_name.to_string();
        record.merge(updates);

        InterestRecord::store(&self.db, user_id, &record)?;

        let ratings: HashMap<String, f32> = record
            .ratings
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        let vector = self.schema.build_vector(&ratings);
        self.index.upsert(user_id, vector, &record.display_name)?;

        self.invalidate_clusters()?;
        debug!(user_id, updated = updates.len(), "profile updated");

        Ok(())
    }

    /// Run keyword extraction on a chat message and, on a hit against the
    /// configured schema, fold it into the profile as a rating scaled by
    /// the extraction confidence. Returns the matched interest, if any.
    pub fn apply_message(
        &self,
        user_id: u32,
        display_name: &str,
        message: &str,
    ) -> Result<Option<&'static str>, KindredError> {
        let (interest, confidence) = match extract_interest(message) {
            Some(hit) => hit,
            None => return Ok(None),
        };
        if !self.schema.contains(interest) {
            return Ok(None);
        }

        let rating = RATING_MIN + (RATING_MAX - RATING_MIN) * confidence;
        let mut updates = HashMap::new();
        updates.insert(interest.to_string(), rating);
        self.update_profile(user_id, display_name, &updates)?;

        Ok(Some(interest))
    }

    /// Top `n` most similar users to `user_id`, excluding the user itself.
    /// A user with no indexed profile gets an empty list.
    pub fn similar_to(&self, user_id: u32, n: usize) -> Result<Vec<u32>, KindredError> {
        let vector = match self.index.vector(user_id)? {
            Some(v) => v,
            None => return Ok(Vec::new()),
        };

        self.index.top_n_similar(&vector, n, Some(user_id))
    }

    /// Resolve display names for a ranked id list, preserving order.
    /// Ids that left the index since ranking are skipped.
    pub fn display_names(&self, user_ids: &[u32]) -> Result<Vec<String>, KindredError> {
        let mut names = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            if let Some(name) = self.index.display_name(*id)? {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Users in the same cluster as `user_id`, excluding the user itself.
    ///
    /// The assignment is computed from an index snapshot on the first query
    /// after an update; the snapshot is taken under the index lock, the
    /// k-means run is not.
    pub fn cluster_mates(&self, user_id: u32) -> Result<Vec<u32>, KindredError> {
        {
            let cache = self.cluster_cache.read()?;
            if let Some(assignment) = cache.as_ref() {
                return Ok(same_cluster(user_id, assignment));
            }
        }

        let snapshot = self.index.snapshot()?;
        let assignment = compute_clusters(&snapshot, self.clusters, self.kmeans_seed)?;
        let mates = same_cluster(user_id, &assignment);

        *self.cluster_cache.write()? = Some(assignment);
        Ok(mates)
    }

    /// Forget a user entirely: durable record first, then the index entry.
    pub fn remove_user(&self, user_id: u32) -> Result<(), KindredError> {
        InterestRecord::remove(&self.db, user_id)?;
        self.index.remove(user_id)?;
        self.invalidate_clusters()?;
        debug!(user_id, "user removed");

        Ok(())
    }

    fn invalidate_clusters(&self) -> Result<(), KindredError> {
        *self.cluster_cache.write()? = None;
        Ok(())
    }
}
