//! FiscalDesk application layer
//!
//! Injectable stores (alerts, loading state, onboarding progress), the auth
//! state cleanup, and the use cases that feed alerts from the backend.

pub mod alerts;
pub mod auth;
pub mod loading;
pub mod onboarding;
pub mod usecases;

pub use alerts::AlertRegistry;
pub use auth::{AuthCleanupReport, AuthStateCleanup};
pub use loading::LoadingRegistry;
pub use onboarding::{OnboardingProgressError, OnboardingProgressStore};
pub use usecases::{AlertProducerError, CheckPaymentAlerts, FetchAlerts};
