//! Use cases that feed the alert registry from the remote backend.

mod check_payment_alerts;
mod fetch_alerts;

pub use check_payment_alerts::{CheckPaymentAlerts, PAYMENT_CHECK_LOADING_KEY, PAYMENT_CHECK_RPC};
pub use fetch_alerts::{FetchAlerts, ALERTS_TABLE, FETCH_ALERTS_LOADING_KEY};

use fd_core::ports::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertProducerError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("unexpected alert payload: {0}")]
    Decode(String),
}
