//! Daily sales ledger per (store, SKU), keyed by (store_id, sku_id, year, day).

use super::CrudService;
use crate::config::{SALES_COUNTERS, SALES_DATA};
use crate::error::AppError;
use crate::query::{Condition, Key, QueryOptions, Select};
use crate::store::{Row, Store};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Composite key of one sales record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesKey {
    pub store_id: String,
    pub sku_id: String,
    pub year: i32,
    pub day: i32,
}

impl SalesKey {
    pub fn to_key(&self) -> Key {
        Key(vec![
            Value::from(self.store_id.as_str()),
            Value::from(self.sku_id.as_str()),
            Value::from(self.year),
            Value::from(self.day),
        ])
    }
}

/// Inclusive `date` bounds, `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Optional narrowing shared by the sales shortcuts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesFilter {
    pub year: Option<i32>,
    pub date_range: Option<DateRange>,
    pub store_id: Option<String>,
    pub sku_id: Option<String>,
    pub type_of_day: Option<String>,
    pub limit: Option<u32>,
}

impl SalesFilter {
    fn conditions(&self) -> Vec<Condition> {
        let mut out = Vec::new();
        if let Some(y) = self.year {
            out.push(Condition::eq("year", y));
        }
        if let Some(r) = &self.date_range {
            out.push(Condition::Gte("date".into(), Value::from(r.start.as_str())));
            out.push(Condition::Lte("date".into(), Value::from(r.end.as_str())));
        }
        if let Some(s) = &self.store_id {
            out.push(Condition::eq("store_id", s.as_str()));
        }
        if let Some(s) = &self.sku_id {
            out.push(Condition::eq("sku_id", s.as_str()));
        }
        if let Some(t) = &self.type_of_day {
            out.push(Condition::eq("type_of_day", t.as_str()));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsDateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Counter totals over a store's records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreAnalytics {
    pub total_initial: i64,
    pub total_sold: i64,
    pub total_returns: i64,
    pub total_donations: i64,
    pub total_reroutes_in: i64,
    pub total_reroutes_out: i64,
    pub total_recycled: i64,
    pub total_final: i64,
    pub record_count: u64,
    pub date_range: AnalyticsDateRange,
}

impl StoreAnalytics {
    fn from_rows(rows: &[Row]) -> Self {
        let total = |col: &str| -> i64 { rows.iter().filter_map(|r| r.get(col).and_then(Value::as_i64)).sum() };
        let dates: Vec<&str> = rows
            .iter()
            .filter_map(|r| r.get("date").and_then(Value::as_str))
            .collect();
        StoreAnalytics {
            total_initial: total(SALES_COUNTERS[0]),
            total_sold: total(SALES_COUNTERS[1]),
            total_returns: total(SALES_COUNTERS[2]),
            total_donations: total(SALES_COUNTERS[3]),
            total_reroutes_in: total(SALES_COUNTERS[4]),
            total_reroutes_out: total(SALES_COUNTERS[5]),
            total_recycled: total(SALES_COUNTERS[6]),
            total_final: total(SALES_COUNTERS[7]),
            record_count: rows.len() as u64,
            date_range: AnalyticsDateRange {
                start: dates.iter().min().map(|d| d.to_string()),
                end: dates.iter().max().map(|d| d.to_string()),
            },
        }
    }
}

#[derive(Clone)]
pub struct SalesDataService {
    crud: CrudService,
}

impl SalesDataService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        SalesDataService {
            crud: CrudService::new(store, &SALES_DATA),
        }
    }

    pub fn crud(&self) -> &CrudService {
        &self.crud
    }

    /// Newest date first unless the options order otherwise.
    pub async fn list(&self, options: &QueryOptions) -> Result<Vec<Row>, AppError> {
        self.crud.find_all(options).await
    }

    pub async fn find_by_key(&self, key: &SalesKey) -> Result<Option<Row>, AppError> {
        self.crud.find_by_id(&key.to_key()).await
    }

    async fn find_filtered(&self, mut conditions: Vec<Condition>, filter: &SalesFilter) -> Result<Vec<Row>, AppError> {
        conditions.extend(filter.conditions());
        self.crud
            .find_where(Select::new(&SALES_DATA, conditions).limit(filter.limit))
            .await
    }

    pub async fn find_by_store(&self, store_id: &str, filter: &SalesFilter) -> Result<Vec<Row>, AppError> {
        self.find_filtered(vec![Condition::eq("store_id", store_id)], filter).await
    }

    pub async fn find_by_sku(&self, sku_id: &str, filter: &SalesFilter) -> Result<Vec<Row>, AppError> {
        self.find_filtered(vec![Condition::eq("sku_id", sku_id)], filter).await
    }

    pub async fn find_by_date_range(&self, start: &str, end: &str, filter: &SalesFilter) -> Result<Vec<Row>, AppError> {
        let range = vec![
            Condition::Gte("date".into(), Value::from(start)),
            Condition::Lte("date".into(), Value::from(end)),
        ];
        self.find_filtered(range, filter).await
    }

    pub async fn find_by_type_of_day(&self, type_of_day: &str, filter: &SalesFilter) -> Result<Vec<Row>, AppError> {
        self.find_filtered(vec![Condition::eq("type_of_day", type_of_day)], filter).await
    }

    pub async fn create(&self, row: Row) -> Result<Row, AppError> {
        self.crud.create(row).await
    }

    pub async fn update(&self, key: &SalesKey, patch: Row) -> Result<Row, AppError> {
        self.crud.update(&key.to_key(), patch).await
    }

    pub async fn delete(&self, key: &SalesKey) -> Result<u64, AppError> {
        self.crud.delete(&key.to_key()).await
    }

    pub async fn create_many(&self, rows: Vec<Row>) -> Result<Vec<Row>, AppError> {
        self.crud.create_many(rows).await
    }

    /// Totals over every matching record of the store; `limit` is ignored.
    pub async fn store_analytics(&self, store_id: &str, filter: &SalesFilter) -> Result<StoreAnalytics, AppError> {
        let mut conditions = vec![Condition::eq("store_id", store_id)];
        conditions.extend(filter.conditions());
        let select = Select::new(&SALES_DATA, conditions).without_includes().unpaged();
        let rows = self.crud.find_where(select).await?;
        Ok(StoreAnalytics::from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SKUS, STORES};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn row(v: Value) -> Row {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    async fn seeded() -> SalesDataService {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        CrudService::new(store.clone(), &SKUS)
            .create(row(json!({"sku_id": "K1", "name": "Milk"})))
            .await
            .unwrap();
        CrudService::new(store.clone(), &STORES)
            .create(row(json!({"store_id": "S1", "geo": "NY"})))
            .await
            .unwrap();
        let svc = SalesDataService::new(store);
        svc.create_many(vec![
            row(json!({"store_id": "S1", "sku_id": "K1", "year": 2024, "day": 1, "date": "2024-01-01",
                       "type_of_day": "weekday", "initial": 100, "sold": 45, "final": 54})),
            row(json!({"store_id": "S1", "sku_id": "K1", "year": 2024, "day": 6, "date": "2024-01-06",
                       "type_of_day": "weekend", "initial": 54, "sold": 30, "returns": 1, "final": 23})),
            row(json!({"store_id": "S1", "sku_id": "K1", "year": 2023, "day": 365, "date": "2023-12-31",
                       "initial": 10, "sold": 10})),
        ])
        .await
        .unwrap();
        svc
    }

    #[tokio::test]
    async fn reads_default_to_newest_first_with_parents() {
        let svc = seeded().await;
        let rows = svc.list(&QueryOptions::new()).await.unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r["date"].as_str().unwrap()).collect();
        assert_eq!(dates, vec!["2024-01-06", "2024-01-01", "2023-12-31"]);
        assert_eq!(rows[0]["stores"]["geo"], "NY");
    }

    #[tokio::test]
    async fn filters_narrow_shortcuts() {
        let svc = seeded().await;
        let filter = SalesFilter {
            year: Some(2024),
            ..Default::default()
        };
        assert_eq!(svc.find_by_store("S1", &filter).await.unwrap().len(), 2);
        let range = svc
            .find_by_date_range("2023-12-01", "2024-01-02", &SalesFilter::default())
            .await
            .unwrap();
        assert_eq!(range.len(), 2);
        let weekend = svc.find_by_type_of_day("weekend", &SalesFilter::default()).await.unwrap();
        assert_eq!(weekend[0]["day"], 6);
        let limited = SalesFilter {
            limit: Some(1),
            ..Default::default()
        };
        assert_eq!(svc.find_by_sku("K1", &limited).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn analytics_totals() {
        let svc = seeded().await;
        let a = svc.store_analytics("S1", &SalesFilter::default()).await.unwrap();
        assert_eq!(a.total_initial, 164);
        assert_eq!(a.total_sold, 85);
        assert_eq!(a.total_returns, 1);
        assert_eq!(a.total_final, 77);
        assert_eq!(a.record_count, 3);
        assert_eq!(a.date_range.start.as_deref(), Some("2023-12-31"));
        assert_eq!(a.date_range.end.as_deref(), Some("2024-01-06"));
        let empty = svc.store_analytics("S9", &SalesFilter::default()).await.unwrap();
        assert_eq!(empty.record_count, 0);
        assert_eq!(empty.date_range.start, None);
    }

    #[tokio::test]
    async fn key_round_trip() {
        let svc = seeded().await;
        let key = SalesKey {
            store_id: "S1".into(),
            sku_id: "K1".into(),
            year: 2024,
            day: 1,
        };
        let updated = svc.update(&key, row(json!({"sold": 50}))).await.unwrap();
        assert_eq!(updated["sold"], 50);
        assert_eq!(updated["final"], 54);
        assert_eq!(svc.delete(&key).await.unwrap(), 1);
        assert!(svc.find_by_key(&key).await.unwrap().is_none());
    }
}
