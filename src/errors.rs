use std::{io, sync::PoisonError};

#[derive(Debug)]
pub enum KindredError {
    RecordEncodeError(bincode::error::EncodeError),
    RecordDecodeError(bincode::error::DecodeError),
    StorageError(rocksdb::Error),
    UserNotFound,
    IndexLockError(String),
    DimensionMismatch { expected: usize, found: usize },
    InvalidClusterCount(usize),
    ConfigParseError(toml::de::Error),
    ConfigReadError(io::Error),
}

impl std::fmt::Display for KindredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KindredError::RecordEncodeError(e) => write!(f, "Record encoding error: {}", e),
            KindredError::RecordDecodeError(e) => write!(f, "Record decoding error: {}", e),
            KindredError::StorageError(e) => write!(f, "RocksDB error: {}", e),
            KindredError::UserNotFound => write!(f, "User not found"),
            KindredError::IndexLockError(e) => write!(f, "Index lock error: {}", e),
            KindredError::DimensionMismatch { expected, found } => write!(
                f,
                "Vector dimension mismatch: expected {}, found {}",
                expected, found
            ),
            KindredError::InvalidClusterCount(k) => {
                write!(f, "Invalid cluster count: {}", k)
            }
            KindredError::ConfigParseError(e) => write!(f, "Config parse error: {}", e),
            KindredError::ConfigReadError(e) => write!(f, "Config read error: {}", e),
        }
    }
}

impl std::error::Error for KindredError {}

impl From<bincode::error::EncodeError> for KindredError {
    fn from(err: bincode::error::EncodeError) -> Self {
        KindredError::RecordEncodeError(err)
    }
}

impl From<bincode::error::DecodeError> for KindredError {
    fn from(err: bincode::error::DecodeError) -> Self {
        KindredError::RecordDecodeError(err)
    }
}

impl From<rocksdb::Error> for KindredError {
    fn from(err: rocksdb::Error) -> Self {
        KindredError::StorageError(err)
    }
}

impl<T> From<PoisonError<T>> for KindredError {
    fn from(err: PoisonError<T>) -> Self {
        KindredError::IndexLockError(err.to_string())
    }
}

impl From<toml::de::Error> for KindredError {
    fn from(err: toml::de::Error) -> Self {
        KindredError::ConfigParseError(err)
    }
}

impl From<io::Error> for KindredError {
    fn from(err: io::Error) -> Self {
        KindredError::ConfigReadError(err)
    }
}
