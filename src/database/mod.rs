pub mod cache;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod registry;

pub use cache::ConnectionCache;
pub use manager::{ClientFactory, ConnectionDescriptor, ConnectionError, ConnectionManager, PgClientFactory};
pub use memory::MemoryRegistry;
pub use postgres::PgRegistryStore;
pub use registry::{RegistryError, RegistryStore};
