//! Data access: generic CrudService plus thin per-entity services over an injected store.

mod crud;
mod profiles;
mod sales_data;
mod skus;
mod store_skus;
mod stores;
mod validation;

pub use crud::{CrudService, BULK_LIMIT};
pub use profiles::ProfileService;
pub use sales_data::{AnalyticsDateRange, DateRange, SalesDataService, SalesFilter, SalesKey, StoreAnalytics};
pub use skus::{SkuService, SHORT_SHELF_LIFE_DAYS};
pub use store_skus::{StoreInfo, StoreSkuCount, StoreSkuService};
pub use stores::StoreService;
pub use validation::RequestValidator;

use crate::store::Store;
use std::sync::Arc;

/// Every service, sharing one store.
#[derive(Clone)]
pub struct Services {
    pub skus: SkuService,
    pub stores: StoreService,
    pub store_skus: StoreSkuService,
    pub sales_data: SalesDataService,
    pub profiles: ProfileService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Services {
            skus: SkuService::new(store.clone()),
            stores: StoreService::new(store.clone()),
            store_skus: StoreSkuService::new(store.clone()),
            sales_data: SalesDataService::new(store.clone()),
            profiles: ProfileService::new(store),
        }
    }
}
