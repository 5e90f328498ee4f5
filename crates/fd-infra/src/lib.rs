pub mod backend;
pub mod notification;
pub mod storage;
pub mod time;

pub use backend::RestBackend;
pub use notification::{ChannelNotifier, TracingNotifier};
pub use storage::{AppStorageProvider, FileStorageBackend, InMemoryStorageBackend};
pub use time::{SystemClock, TimerId, TimerScope};
