pub mod ratings;
pub mod reviews;
pub mod storage;

pub use ratings::RatingStore;
pub use reviews::ReviewStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageKey};
