//! # fd-bootstrap
//!
//! Assembly layer: reads the TOML configuration, installs the tracing
//! subscriber, builds every adapter and store, and runs the startup sequence.
//! This is the only crate that depends on `fd-core`, `fd-infra` and `fd-app`
//! at once.

pub mod config;
pub mod runtime;
pub mod tracing;
pub mod wiring;

pub use config::{default_config_path, load_config, resolve_config};
pub use runtime::{run_startup, start_payment_polling, StartupReport};
pub use wiring::{wire_app, AppContext, WiringError, WiringResult};
