//! # Pure Data Module - Data Transfer Objects Only
//!
//! Configuration data structures and the TOML → DTO mapping.
//!
//! No validation and no default calculation happen here: a missing value
//! maps to its empty form (empty string, zero, `false`) and the wiring layer
//! decides what an empty value means.

mod app_config;

pub use app_config::{
    AlertsConfig, AppConfig, BackendConfig, Environment, LoggingConfig, OnboardingConfig,
    SecurityConfig, StorageConfig,
};
