// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod seed;
pub mod store;

pub use cache::{CacheManager, CacheKey, CacheError, CacheStats};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use seed::seed_sample_businesses;
pub use store::{DiscoveryStore, RegistrationTx, StoreError};
