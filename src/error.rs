//! Describes the failures reported by caches, their persistence and their settings.
//!
//! All public functions of this crate return an **anyhow::Result**. The root cause of each
//! failure is a [CacheError](CacheError) so that callers can distinguish the failure kinds:
//!
//! ```
//! # use lru_store::error::CacheError;
//! # use lru_store::lru::LRUCache;
//! let error = LRUCache::<i32, String>::new(0).err().unwrap();
//! match error.downcast_ref::<CacheError>() {
//!     Some(CacheError::InvalidCapacity) => (),
//!     _ => panic!("Unexpected error: {}", error),
//! }
//! ```
//!
//! Note that a cache miss is not an error at all, **get** simply returns **None**.
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Enumerates the kinds of failures which can occur.
#[derive(Debug)]
pub enum CacheError {
    /// A cache was requested which cannot hold a single entry.
    InvalidCapacity,

    /// Reading or writing the given file failed.
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error reported by the operating system.
        source: std::io::Error,
    },

    /// Persisted data was malformed or couldn't be encoded.
    Format(String),

    /// A settings document was invalid.
    Settings(String),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::InvalidCapacity => write!(f, "A cache needs a capacity of at least 1"),
            CacheError::Io { path, source } => {
                write!(f, "Cannot access {}: {}", path.to_string_lossy(), source)
            }
            CacheError::Format(message) => write!(f, "Invalid cache data: {}", message),
            CacheError::Settings(message) => write!(f, "Invalid settings: {}", message),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
