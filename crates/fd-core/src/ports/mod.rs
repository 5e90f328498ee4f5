//! Port interfaces for the application layer
//!
//! Ports define the contract between the stores/use cases and the
//! infrastructure implementations in `fd-infra`. Core logic depends only on
//! these traits, so tests can swap any adapter for a mock.

pub mod backend;
mod clock;
mod notification;
pub mod storage;

pub use backend::{BackendError, BackendPort, Filter, FilterOp};
pub use clock::*;
pub use notification::NotificationPort;
pub use storage::{StorageBackendPort, StorageError, StorageProviderPort};
