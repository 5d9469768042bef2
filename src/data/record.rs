use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bincode::{
    config::{self},
    Decode, Encode,
};
use rocksdb::DB;
use tracing::debug;

use crate::errors::KindredError;
use crate::index::SimilarityIndex;
use crate::schema::InterestSchema;

/// Ratings live on a 1-10 scale.
pub const RATING_MIN: f32 = 1.0;
pub const RATING_MAX: f32 = 10.0;

/// Durable per-user interest record: the source of truth the index vector
/// is projected from. Interests the user never rated are simply absent.
#[derive(Debug, Clone, Encode, Decode)]
pub struct InterestRecord {
    pub display_name: String,
    pub ratings: BTreeMap<String, f32>,
}

impl InterestRecord {
    pub fn new(display_name: &str) -> Self {
        InterestRecord {
            display_name: display_name.to_string(),
            ratings: BTreeMap::new(),
        }
    }

    /// Apply a partial update: only the named interests change, everything
    /// else keeps its stored value. Ratings are clamped to the 1-10 scale;
    /// non-finite values are dropped.
    pub fn merge(&mut self, updates: &HashMap<String, f32>) {
        for (name, rating) in updates {
            if rating.is_finite() {
                self.ratings
                    .insert(name.clone(), clamp_rating(*rating));
            }
        }
    }

    /// Store a record
    pub fn store(db: &Arc<DB>, user_id: u32, record: &InterestRecord) -> Result<(), KindredError> {
        let key = user_key(user_id);
        let value = record.encode()?;

        db.put(key.as_bytes(), &value)?;

        Ok(())
    }

    /// Load a record
    pub fn load(db: &Arc<DB>, user_id: u32) -> Result<Self, KindredError> {
        let key = user_key(user_id);

        let value = db.get(key.as_bytes())?;
        match value {
            Some(v) => InterestRecord::decode(&v),
            None => Err(KindredError::UserNotFound),
        }
    }

    /// Delete a record. Idempotent; deleting an absent key is a no-op.
    pub fn remove(db: &Arc<DB>, user_id: u32) -> Result<(), KindredError> {
        db.delete(user_key(user_id).as_bytes())?;
        Ok(())
    }

    /// Encode the record to a byte vector using bincode
    fn encode(&self) -> Result<Vec<u8>, KindredError> {
        let config = config::standard();
        let encoded: Vec<u8> = bincode::encode_to_vec(self, config)?;

        Ok(encoded)
    }

    /// Decode a record from a byte slice
    fn decode(bytes: &[u8]) -> Result<Self, KindredError> {
        let config = config::standard();
        let (decoded, _): (Self, _) = bincode::decode_from_slice(bytes, config)?;

        Ok(decoded)
    }
}

pub fn clamp_rating(rating: f32) -> f32 {
    if rating < RATING_MIN {
        RATING_MIN
    } else if rating > RATING_MAX {
        RATING_MAX
    } else {
        rating
    }
}

fn user_key(user_id: u32) -> String {
    format!("user:{}", user_id)
}

/// Rebuild the similarity index from durable storage. Called once at
/// startup; the index is a derived cache, so this is the only durability
/// the index itself gets.
pub fn bulk_load(
    db: &Arc<DB>,
    index: &SimilarityIndex,
    schema: &InterestSchema,
) -> Result<usize, KindredError> {
    let iter = db.iterator(rocksdb::IteratorMode::Start);
    let mut loaded_count = 0;

    for item in iter {
        let (key, value) = item?;

        // Only "user:{id}" keys hold interest records
        if let Ok(key_str) = std::str::from_utf8(&key) {
            if let Some(id_str) = key_str.strip_prefix("user:") {
                if let Ok(user_id) = id_str.parse::<u32>() {
                    let record = InterestRecord::decode(&value)?;
                    let ratings: HashMap<String, f32> = record
                        .ratings
                        .iter()
                        .map(|(k, v)| (k.clone(), *v))
                        .collect();
                    let vector = schema.build_vector(&ratings);

                    index.upsert(user_id, vector, &record.display_name)?;
                    loaded_count += 1;
                }
            }
        }
    }

    debug!(loaded = loaded_count, "rebuilt similarity index from storage");
    Ok(loaded_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::db::open_db;
    use tempdir::TempDir;

    fn record_with_ratings(pairs: &[(&str, f32)]) -> InterestRecord {
        let mut record = InterestRecord::new("alice");
        for (name, rating) in pairs {
            record.ratings.insert(name.to_string(), *rating);
        }
        record
    }

    #[test]
    fn test_merge_changes_only_named_interests() {
        let mut record = record_with_ratings(&[("cooking", 9.0), ("hiking", 2.0)]);

        let mut updates = HashMap::new();
        updates.insert("hiking".to_string(), 7.0);
        record.merge(&updates);

        assert_eq!(record.ratings.get("cooking"), Some(&9.0));
        assert_eq!(record.ratings.get("hiking"), Some(&7.0));
    }

    #[test]
    fn test_merge_clamps_to_rating_scale() {
        let mut record = InterestRecord::new("alice");

        let mut updates = HashMap::new();
        updates.insert("cooking".to_string(), 42.0);
        updates.insert("hiking".to_string(), -3.0);
        record.merge(&updates);

        assert_eq!(record.ratings.get("cooking"), Some(&10.0));
        assert_eq!(record.ratings.get("hiking"), Some(&1.0));
    }

    #[test]
    fn test_merge_drops_non_finite_ratings() {
        let mut record = record_with_ratings(&[("cooking", 5.0)]);

        let mut updates = HashMap::new();
        updates.insert("cooking".to_string(), f32::NAN);
        record.merge(&updates);

        assert_eq!(record.ratings.get("cooking"), Some(&5.0));
    }

    #[test]
    fn test_store_and_load_roundtrip() {
        let temp_dir = TempDir::new("kindred_records").expect("Failed to create temp dir");
        let db = open_db(temp_dir.path()).expect("Failed to open db");

        let record = record_with_ratings(&[("cooking", 9.0), ("music", 3.5)]);
        InterestRecord::store(&db, 7, &record).expect("Failed to store record");

        let loaded = InterestRecord::load(&db, 7).expect("Failed to load record");
        assert_eq!(loaded.display_name, "alice");
        assert_eq!(loaded.ratings, record.ratings);
    }

    #[test]
    fn test_load_missing_user() {
        let temp_dir = TempDir::new("kindred_records").expect("Failed to create temp dir");
        let db = open_db(temp_dir.path()).expect("Failed to open db");

        let result = InterestRecord::load(&db, 404);
        assert!(matches!(result, Err(KindredError::UserNotFound)));
    }

    #[test]
    fn test_decode_invalid_data() {
        let invalid_data = vec![0xFF, 0xFF, 0xFF];
        let result = InterestRecord::decode(&invalid_data);
        assert!(result.is_err());
    }

    #[test]
    fn test_bulk_load_rebuilds_index() {
        let temp_dir = TempDir::new("kindred_bulk").expect("Failed to create temp dir");
        let db = open_db(temp_dir.path()).expect("Failed to open db");
        let schema = InterestSchema::new(["cooking", "hiking", "music"]);
        let index = SimilarityIndex::new(schema.dim());

        let mut alice = InterestRecord::new("alice");
        alice.ratings.insert("cooking".to_string(), 9.0);
        InterestRecord::store(&db, 1, &alice).unwrap();

        let mut bob = InterestRecord::new("bob");
        bob.ratings.insert("music".to_string(), 8.0);
        InterestRecord::store(&db, 2, &bob).unwrap();

        // Unrelated keys are skipped
        db.put(b"session:xyz", b"opaque").unwrap();

        let loaded = bulk_load(&db, &index, &schema).expect("Failed to bulk load");
        assert_eq!(loaded, 2);
        assert_eq!(index.vector(1).unwrap(), Some(vec![9.0, 0.0, 0.0]));
        assert_eq!(index.vector(2).unwrap(), Some(vec![0.0, 0.0, 8.0]));
        assert_eq!(index.display_name(2).unwrap(), Some("bob".to_string()));
    }
}
