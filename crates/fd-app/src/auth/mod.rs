mod cleanup;

pub use cleanup::{AuthCleanupReport, AuthStateCleanup};
