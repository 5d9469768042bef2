pub mod db;
pub mod record;

pub use db::open_db;
pub use record::{bulk_load, InterestRecord};
