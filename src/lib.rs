use std::sync::Arc;

use tracing::info;

use crate::errors::KindredError;

pub mod cluster;
mod config;
mod data;
pub mod errors;
mod extract;
mod index;
mod pipeline;
mod schema;

// Exports for external use
pub use config::Config;
pub use data::record::InterestRecord;
pub use extract::extract_interest;
pub use index::{cosine_similarity, SimilarityIndex};
pub use pipeline::Pipeline;
pub use schema::InterestSchema;

/// Bring the engine up from configuration: open the record store, build the
/// schema and an empty index, then rebuild the index from storage.
pub fn initialize(config: &Config) -> Result<Pipeline, KindredError> {
    let db = data::open_db(&config.db_path)?;
    let schema = Arc::new(InterestSchema::new(config.interests.clone()));
    let index = Arc::new(SimilarityIndex::new(schema.dim()));

    let loaded = data::bulk_load(&db, &index, &schema)?;
    info!(users = loaded, dim = schema.dim(), "engine initialized");

    Ok(Pipeline::new(
        db,
        index,
        schema,
        config.clusters,
        config.kmeans_seed,
    ))
}
