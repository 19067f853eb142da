// Durable key/value storage for the local profile
// Survives restarts; the typed view over it lives in pigeon-core

pub mod error;
pub mod memory;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// String keys, string values. Implementations must be safe to share
/// between the controllers that each own a disjoint set of keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
