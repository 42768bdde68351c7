use super::CrudService;
use crate::config::SKUS;
use crate::error::AppError;
use crate::query::{Condition, OrderBy, Page, Select};
use crate::store::{Row, Store};
use std::sync::Arc;

/// Default upper bound for the short-shelf-life filter.
pub const SHORT_SHELF_LIFE_DAYS: i32 = 7;

#[derive(Clone)]
pub struct SkuService {
    crud: CrudService,
}

impl SkuService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        SkuService {
            crud: CrudService::new(store, &SKUS),
        }
    }

    pub fn crud(&self) -> &CrudService {
        &self.crud
    }

    /// Exact name match; first in key order when names repeat.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Row>, AppError> {
        self.crud.find_one(vec![Condition::eq("name", name)]).await
    }

    pub async fn find_by_shelf_life_range(&self, min_days: i32, max_days: i32, page: Page) -> Result<Vec<Row>, AppError> {
        let select = Select::new(
            &SKUS,
            vec![
                Condition::Gte("shelf_life_days".into(), min_days.into()),
                Condition::Lte("shelf_life_days".into(), max_days.into()),
            ],
        )
        .ordered(&SKUS, OrderBy::asc("shelf_life_days"))
        .paged(page);
        self.crud.find_where(select).await
    }

    pub async fn short_shelf_life(&self, max_days: i32) -> Result<Vec<Row>, AppError> {
        let select = Select::new(&SKUS, vec![Condition::Lte("shelf_life_days".into(), max_days.into())])
            .ordered(&SKUS, OrderBy::asc("shelf_life_days"));
        self.crud.find_where(select).await
    }

    /// Case-insensitive substring match on `name`.
    pub async fn search_by_name(&self, term: &str, page: Page) -> Result<Vec<Row>, AppError> {
        let select = Select::new(&SKUS, vec![Condition::ILike("name".into(), term.to_string())])
            .ordered(&SKUS, OrderBy::asc("name"))
            .paged(page);
        self.crud.find_where(select).await
    }
}
