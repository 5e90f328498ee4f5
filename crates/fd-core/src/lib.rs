//! # fd-core
//!
//! Core domain models and business logic for FiscalDesk.
//!
//! This crate contains the alert and onboarding models, the auth key
//! namespace, the port traits implemented by `fd-infra`, and the local
//! storage accessors (`SafeStorage`, `SecureStorage`) that sit on top of
//! those ports.

pub mod alert;
pub mod auth;
pub mod config;
pub mod ids;
pub mod notification;
pub mod onboarding;
pub mod ports;
pub mod storage;

// Re-export commonly used types at the crate root
pub use alert::{Alert, AlertAction, AlertPriority, AlertType, NewAlert};
pub use config::AppConfig;
pub use ids::AlertId;
pub use notification::{Notification, NotificationLevel};
pub use onboarding::{OnboardingData, OnboardingPatch};
pub use storage::{SafeStorage, SecureStorage, StorageScope};
