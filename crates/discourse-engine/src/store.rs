//! # Store Interface
//!
//! The external tuple store is a black box. The engine only needs:
//! - `query`: run compiled query text, get ordered rows back
//! - entity metadata accessors (`title_of`, `id_of_title`, `shallow_children_of`)
//!
//! Implementations may be synchronous underneath; every call is a potential
//! suspension point and nothing else in the engine is.

use crate::error::StoreError;
use async_trait::async_trait;
use discourse_core::EntityId;
use serde_json::Value;

/// One result tuple.
pub type Row = Vec<Value>;

/// The external store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Execute compiled query text.
    async fn query(&self, query: &str) -> Result<Vec<Row>, StoreError>;

    /// Title of a page-like entity, if it has one.
    async fn title_of(&self, id: &EntityId) -> Result<Option<String>, StoreError>;

    /// Id of the entity with this exact title.
    async fn id_of_title(&self, title: &str) -> Result<Option<EntityId>, StoreError>;

    /// Direct children, in store order.
    async fn shallow_children_of(&self, id: &EntityId) -> Result<Vec<EntityId>, StoreError>;
}

/// Render one cell as plain text. Strings lose their quotes.
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
