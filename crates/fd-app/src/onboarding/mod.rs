mod progress_store;

pub use progress_store::{
    OnboardingProgressError, OnboardingProgressStore, ONBOARDING_PROGRESS_KEY,
};
