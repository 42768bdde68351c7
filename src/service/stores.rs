use super::CrudService;
use crate::config::STORES;
use crate::error::AppError;
use crate::query::{Condition, OrderBy, Page, Select};
use crate::store::{Row, Store};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct StoreService {
    crud: CrudService,
}

impl StoreService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        StoreService {
            crud: CrudService::new(store, &STORES),
        }
    }

    pub fn crud(&self) -> &CrudService {
        &self.crud
    }

    /// Stores in one geography, oldest first.
    pub async fn find_by_geo(&self, geo: &str) -> Result<Vec<Row>, AppError> {
        let select = Select::new(&STORES, vec![Condition::eq("geo", geo)])
            .ordered(&STORES, OrderBy::asc("created_at"));
        self.crud.find_where(select).await
    }

    pub async fn find_by_religion(&self, religion: &str) -> Result<Vec<Row>, AppError> {
        let select = Select::new(&STORES, vec![Condition::eq("religion", religion)])
            .ordered(&STORES, OrderBy::asc("geo"));
        self.crud.find_where(select).await
    }

    pub async fn search_by_geo(&self, term: &str, page: Page) -> Result<Vec<Row>, AppError> {
        let select = Select::new(&STORES, vec![Condition::ILike("geo".into(), term.to_string())])
            .ordered(&STORES, OrderBy::asc("geo"))
            .paged(page);
        self.crud.find_where(select).await
    }

    pub async fn unique_geos(&self) -> Result<Vec<String>, AppError> {
        self.distinct("geo").await
    }

    pub async fn unique_religions(&self) -> Result<Vec<String>, AppError> {
        self.distinct("religion").await
    }

    /// Sorted distinct non-null values of one text column.
    async fn distinct(&self, column: &str) -> Result<Vec<String>, AppError> {
        let select = Select::new(&STORES, vec![Condition::NotNull(column.to_string())])
            .ordered(&STORES, OrderBy::asc(column))
            .unpaged();
        let rows = self.crud.find_where(select).await?;
        let values: BTreeSet<String> = rows
            .iter()
            .filter_map(|r| r.get(column).and_then(|v| v.as_str()).map(str::to_string))
            .collect();
        Ok(values.into_iter().collect())
    }
}
