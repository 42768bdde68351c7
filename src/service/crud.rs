//! Generic CRUD over one entity and an injected store.

use crate::config::EntityDef;
use crate::error::AppError;
use crate::query::{Condition, FilterValue, Key, QueryOptions, Select};
use crate::store::{Row, Store, StoreError};
use serde_json::Value;
use std::sync::Arc;

/// Maximum rows accepted by one batch insert.
pub const BULK_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct CrudService {
    store: Arc<dyn Store>,
    entity: &'static EntityDef,
}

impl CrudService {
    pub fn new(store: Arc<dyn Store>, entity: &'static EntityDef) -> Self {
        CrudService { store, entity }
    }

    pub fn entity(&self) -> &'static EntityDef {
        self.entity
    }

    /// Log the failing operation and convert. Unique violations name the entity.
    fn fault(&self, operation: &'static str) -> impl FnOnce(StoreError) -> AppError {
        let entity = self.entity;
        move |e| {
            tracing::error!(table = entity.table, operation, error = %e, "store operation failed");
            match e {
                StoreError::UniqueViolation { .. } => AppError::Conflict(format!("{} already exists", entity.label)),
                other => AppError::from(other),
            }
        }
    }

    fn not_found(&self, key: &Key) -> AppError {
        AppError::NotFound(format!("{} '{}'", self.entity.label, key.display()))
    }

    /// Primary key of a stored row.
    pub fn key_of(&self, row: &Row) -> Key {
        Key(self
            .entity
            .pk_columns
            .iter()
            .map(|c| row.get(*c).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// List rows. Never NotFound; an empty table is an empty list.
    pub async fn find_all(&self, options: &QueryOptions) -> Result<Vec<Row>, AppError> {
        self.find_where(Select::from_options(self.entity, options)).await
    }

    pub async fn find_where(&self, select: Select) -> Result<Vec<Row>, AppError> {
        self.store
            .select(self.entity, &select)
            .await
            .map_err(self.fault("find_all"))
    }

    /// First row matching `conditions` in the default order.
    pub async fn find_one(&self, conditions: Vec<Condition>) -> Result<Option<Row>, AppError> {
        let select = Select::new(self.entity, conditions).limit(Some(1));
        let rows = self
            .store
            .select(self.entity, &select)
            .await
            .map_err(self.fault("find_one"))?;
        Ok(rows.into_iter().next())
    }

    pub async fn find_by_id(&self, key: &Key) -> Result<Option<Row>, AppError> {
        let conditions = key.conditions(self.entity)?;
        let rows = self
            .store
            .select(self.entity, &Select::new(self.entity, conditions).limit(Some(1)))
            .await
            .map_err(self.fault("find_by_id"))?;
        Ok(rows.into_iter().next())
    }

    /// Like `find_by_id`, but a missing row is `NotFound`.
    pub async fn get(&self, key: &Key) -> Result<Row, AppError> {
        self.find_by_id(key).await?.ok_or_else(|| self.not_found(key))
    }

    pub async fn create(&self, row: Row) -> Result<Row, AppError> {
        let mut rows = self
            .store
            .insert(self.entity, vec![row])
            .await
            .map_err(self.fault("create"))?;
        let created = rows.pop().ok_or_else(|| {
            AppError::Store(StoreError::Database(sqlx::Error::RowNotFound))
        })?;
        self.with_includes(created).await
    }

    /// Partial replace. Key columns in the patch are ignored; an empty patch returns the current row.
    pub async fn update(&self, key: &Key, mut patch: Row) -> Result<Row, AppError> {
        let conditions = key.conditions(self.entity)?;
        patch.retain(|k, _| !self.entity.is_pk(k));
        let rows = self
            .store
            .update(self.entity, &conditions, patch)
            .await
            .map_err(self.fault("update"))?;
        let updated = rows.into_iter().next().ok_or_else(|| self.not_found(key))?;
        self.with_includes(updated).await
    }

    /// Idempotent: deleting nothing still succeeds. Returns the number of rows removed.
    pub async fn delete(&self, key: &Key) -> Result<u64, AppError> {
        let conditions = key.conditions(self.entity)?;
        self.store
            .delete(self.entity, &conditions)
            .await
            .map_err(self.fault("delete"))
    }

    pub async fn count(&self, filters: &[(String, FilterValue)]) -> Result<u64, AppError> {
        let conditions: Vec<Condition> = filters
            .iter()
            .map(|(c, v)| Condition::from_filter(c, v))
            .collect();
        self.count_where(&conditions).await
    }

    pub async fn count_where(&self, conditions: &[Condition]) -> Result<u64, AppError> {
        self.store
            .count(self.entity, conditions)
            .await
            .map_err(self.fault("count"))
    }

    /// All rows or none, in one transaction.
    pub async fn create_many(&self, rows: Vec<Row>) -> Result<Vec<Row>, AppError> {
        if rows.len() > BULK_LIMIT {
            return Err(AppError::BadRequest(format!(
                "batch create limited to {} items",
                BULK_LIMIT
            )));
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let created = self
            .store
            .insert(self.entity, rows)
            .await
            .map_err(self.fault("create_many"))?;
        if self.entity.includes.is_empty() {
            return Ok(created);
        }
        let mut out = Vec::with_capacity(created.len());
        for row in created {
            out.push(self.with_includes(row).await?);
        }
        Ok(out)
    }

    /// Re-read a written row so parent rows come back inline.
    async fn with_includes(&self, row: Row) -> Result<Row, AppError> {
        if self.entity.includes.is_empty() {
            return Ok(row);
        }
        let key = self.key_of(&row);
        Ok(self.find_by_id(&key).await?.unwrap_or(row))
    }
}
