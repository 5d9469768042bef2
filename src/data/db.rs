use std::path::Path;
use std::sync::Arc;

use rocksdb::{Options, DB};

use crate::errors::KindredError;

// Configure RocksDB options
fn rocksdb_options() -> Options {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts
}

/// Open the durable record store at the given path. The handle is passed
/// explicitly to whoever needs it; there is no ambient global instance.
pub fn open_db(path: impl AsRef<Path>) -> Result<Arc<DB>, KindredError> {
    let db = DB::open(&rocksdb_options(), path)?;
    Ok(Arc::new(db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_rocksdb_open() {
        let temp_dir = TempDir::new("kindred_db").expect("Failed to create temp dir");
        let db = open_db(temp_dir.path()).expect("Failed to open RocksDB in temp dir");

        db.put(b"key1", b"value1").expect("Failed to put value");
        let value = db.get(b"key1").expect("Failed to get value").unwrap();
        assert_eq!(value.as_slice(), b"value1");
    }
}
