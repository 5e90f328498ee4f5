mod file;
mod memory;
mod provider;

pub use file::{FileStorageBackend, DEFAULT_LOCAL_STORAGE_FILE};
pub use memory::InMemoryStorageBackend;
pub use provider::{AppStorageProvider, UnavailableStorageProvider};
