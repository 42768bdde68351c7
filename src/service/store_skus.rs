use super::CrudService;
use crate::config::STORE_SKUS;
use crate::error::AppError;
use crate::query::{Condition, Key, QueryOptions, Select};
use crate::store::{Row, Store};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreInfo {
    pub geo: Option<String>,
    pub religion: Option<String>,
}

/// One entry of the per-store SKU count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSkuCount {
    pub store_id: String,
    pub store_info: StoreInfo,
    pub sku_count: u64,
}

#[derive(Clone)]
pub struct StoreSkuService {
    crud: CrudService,
}

fn pair(store_id: &str, sku_id: &str) -> Key {
    Key(vec![Value::from(store_id), Value::from(sku_id)])
}

impl StoreSkuService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        StoreSkuService {
            crud: CrudService::new(store, &STORE_SKUS),
        }
    }

    pub fn crud(&self) -> &CrudService {
        &self.crud
    }

    pub async fn list(&self, options: &QueryOptions) -> Result<Vec<Row>, AppError> {
        self.crud.find_all(options).await
    }

    pub async fn skus_for_store(&self, store_id: &str) -> Result<Vec<Row>, AppError> {
        self.crud
            .find_where(Select::new(&STORE_SKUS, vec![Condition::eq("store_id", store_id)]))
            .await
    }

    pub async fn stores_for_sku(&self, sku_id: &str) -> Result<Vec<Row>, AppError> {
        self.crud
            .find_where(Select::new(&STORE_SKUS, vec![Condition::eq("sku_id", sku_id)]))
            .await
    }

    pub async fn exists(&self, store_id: &str, sku_id: &str) -> Result<bool, AppError> {
        let conditions = pair(store_id, sku_id).conditions(&STORE_SKUS)?;
        Ok(self.crud.count_where(&conditions).await? > 0)
    }

    /// Duplicate pairs are rejected by the primary key and surface as `Conflict`.
    pub async fn create(&self, store_id: &str, sku_id: &str) -> Result<Row, AppError> {
        let mut row = Row::new();
        row.insert("store_id".into(), store_id.into());
        row.insert("sku_id".into(), sku_id.into());
        self.crud.create(row).await
    }

    pub async fn delete(&self, store_id: &str, sku_id: &str) -> Result<u64, AppError> {
        self.crud.delete(&pair(store_id, sku_id)).await
    }

    pub async fn create_many(&self, rows: Vec<Row>) -> Result<Vec<Row>, AppError> {
        self.crud.create_many(rows).await
    }

    /// Number of linked SKUs per store, with the store's attributes, in store order.
    pub async fn sku_count_by_store(&self) -> Result<Vec<StoreSkuCount>, AppError> {
        let rows = self
            .crud
            .find_where(Select::new(&STORE_SKUS, Vec::new()).unpaged())
            .await?;
        let mut counts: BTreeMap<String, StoreSkuCount> = BTreeMap::new();
        for row in &rows {
            let Some(store_id) = row.get("store_id").and_then(Value::as_str) else {
                continue;
            };
            let text = |k: &str| {
                row.get("stores")
                    .and_then(|s| s.get(k))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            counts
                .entry(store_id.to_string())
                .or_insert_with(|| StoreSkuCount {
                    store_id: store_id.to_string(),
                    store_info: StoreInfo {
                        geo: text("geo"),
                        religion: text("religion"),
                    },
                    sku_count: 0,
                })
                .sku_count += 1;
        }
        Ok(counts.into_values().collect())
    }
}
