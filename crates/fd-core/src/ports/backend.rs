//! Remote backend port
//!
//! The hosted Backend-as-a-Service is an opaque collaborator: table access
//! with filter predicates, named server-side procedures, and serverless
//! function invocation. Nothing in the core reaches the network except
//! through this trait.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    #[error("backend transport error: {0}")]
    Transport(String),

    #[error("backend returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("failed to decode backend response: {0}")]
    Decode(String),
}

/// Comparison operator of a row filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Is,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::Is => "is",
        }
    }
}

/// Row filter predicate: `column <op> value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }
}

#[async_trait]
pub trait BackendPort: Send + Sync {
    /// Select rows of `table` matching every filter.
    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, BackendError>;

    /// Insert one row (object) or many (array); returns the stored rows.
    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>, BackendError>;

    /// Patch rows matching every filter; returns the updated rows.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, BackendError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), BackendError>;

    /// Call a named server-side procedure.
    async fn rpc(&self, name: &str, args: Value) -> Result<Value, BackendError>;

    /// Invoke a serverless function.
    async fn invoke(&self, function: &str, payload: Value) -> Result<Value, BackendError>;
}
