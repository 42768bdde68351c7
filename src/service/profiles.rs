use super::CrudService;
use crate::config::PROFILES;
use crate::error::AppError;
use crate::query::{Condition, Select};
use crate::store::{Row, Store};
use std::sync::Arc;

/// Application user profiles (`/api/users`), keyed by uuid.
#[derive(Clone)]
pub struct ProfileService {
    crud: CrudService,
}

impl ProfileService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        ProfileService {
            crud: CrudService::new(store, &PROFILES),
        }
    }

    pub fn crud(&self) -> &CrudService {
        &self.crud
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Row>, AppError> {
        self.crud.find_one(vec![Condition::eq("email", email)]).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Row>, AppError> {
        self.crud.find_one(vec![Condition::eq("username", username)]).await
    }

    /// Active profiles, newest first.
    pub async fn active_profiles(&self) -> Result<Vec<Row>, AppError> {
        self.crud
            .find_where(Select::new(&PROFILES, vec![Condition::eq("is_active", true)]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn lookups_and_active_filter() {
        let svc = ProfileService::new(Arc::new(MemoryStore::new()));
        for v in [
            json!({"email": "ann@example.com", "username": "ann"}),
            json!({"email": "bob@example.com", "username": "bob", "is_active": false}),
        ] {
            let Value::Object(m) = v else { unreachable!() };
            svc.crud().create(m).await.unwrap();
        }
        let ann = svc.find_by_email("ann@example.com").await.unwrap().unwrap();
        assert_eq!(ann["username"], "ann");
        assert_eq!(ann["role"], "user");
        assert!(svc.find_by_username("bob").await.unwrap().is_some());
        let active = svc.active_profiles().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0]["email"], "ann@example.com");
        let dup = json!({"email": "ann@example.com"});
        let Value::Object(m) = dup else { unreachable!() };
        assert!(matches!(svc.crud().create(m).await, Err(AppError::Conflict(_))));
    }
}
