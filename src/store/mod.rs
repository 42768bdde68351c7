//! Storage seam. Services hold an `Arc<dyn Store>` injected at construction.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::config::EntityDef;
use crate::query::{Condition, Select};
use async_trait::async_trait;
use thiserror::Error;

/// One table row as a JSON object keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key in {table}: {detail}")]
    UniqueViolation { table: String, detail: String },
    #[error("foreign key violation in {table}: {detail}")]
    ForeignKeyViolation { table: String, detail: String },
    #[error("check violation in {table}: {detail}")]
    CheckViolation { table: String, detail: String },
    #[error("null value in {table}.{column}")]
    NotNullViolation { table: String, column: String },
    #[error("column {column} does not exist in {table}")]
    UnknownColumn { table: String, column: String },
    #[error("invalid value for {table}.{column}: {detail}")]
    InvalidValue {
        table: String,
        column: String,
        detail: String,
    },
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, entity: &'static EntityDef, select: &Select) -> Result<Vec<Row>, StoreError>;

    async fn count(&self, entity: &'static EntityDef, conditions: &[Condition]) -> Result<u64, StoreError>;

    /// Inserts every row or none. Returns stored rows including defaults.
    async fn insert(&self, entity: &'static EntityDef, rows: Vec<Row>) -> Result<Vec<Row>, StoreError>;

    async fn update(
        &self,
        entity: &'static EntityDef,
        conditions: &[Condition],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError>;

    /// Returns the number of deleted rows.
    async fn delete(&self, entity: &'static EntityDef, conditions: &[Condition]) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
