use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Alert identifier
///
/// Locally created alerts get a random UUID; alerts fetched from the backend
/// keep whatever id the remote row carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(String);

impl_id!(AlertId);
