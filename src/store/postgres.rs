//! PostgreSQL store. Every statement comes from `sql::builder` and runs with bound parameters.

use super::{Row, Store, StoreError};
use crate::config::EntityDef;
use crate::query::{Condition, Select};
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

fn bind(q: &QueryBuf) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from(p));
    }
    query
}

/// First double-quoted name in a PostgreSQL message, e.g. `column "colour" does not exist`.
fn quoted_name(message: &str) -> Option<String> {
    let start = message.find('"')? + 1;
    let len = message[start..].find('"')?;
    Some(message[start..start + len].to_string())
}

/// Map SQLSTATE classes to typed store errors; anything else stays a database error.
fn classify(table: &str, e: sqlx::Error) -> StoreError {
    let (code, message, constraint) = match &e {
        sqlx::Error::Database(db) => (
            db.code().map(|c| c.into_owned()).unwrap_or_default(),
            db.message().to_string(),
            db.constraint().map(str::to_string),
        ),
        _ => return StoreError::Database(e),
    };
    let table = table.to_string();
    let detail = match constraint {
        Some(c) => format!("{} ({})", message, c),
        None => message.clone(),
    };
    match code.as_str() {
        "23505" => StoreError::UniqueViolation { table, detail },
        "23503" => StoreError::ForeignKeyViolation { table, detail },
        "23514" => StoreError::CheckViolation { table, detail },
        "23502" => StoreError::NotNullViolation {
            table,
            column: quoted_name(&message).unwrap_or(message),
        },
        "42703" => StoreError::UnknownColumn {
            table,
            column: quoted_name(&message).unwrap_or(message),
        },
        c if c.starts_with("22") => StoreError::InvalidValue {
            table,
            column: String::new(),
            detail,
        },
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn select(&self, entity: &'static EntityDef, select: &Select) -> Result<Vec<Row>, StoreError> {
        let q = sql::select(entity, select);
        let rows = bind(&q)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(entity.table, e))?;
        Ok(rows.iter().map(row_to_map).collect())
    }

    async fn count(&self, entity: &'static EntityDef, conditions: &[Condition]) -> Result<u64, StoreError> {
        let q = sql::count(entity, conditions);
        let row = bind(&q)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(entity.table, e))?;
        let n: i64 = sqlx::Row::try_get(&row, "count")?;
        Ok(n.max(0) as u64)
    }

    async fn insert(&self, entity: &'static EntityDef, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let q = sql::insert(entity, row);
            let stored = bind(&q)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| classify(entity.table, e))?;
            out.push(row_to_map(&stored));
        }
        tx.commit().await?;
        Ok(out)
    }

    async fn update(
        &self,
        entity: &'static EntityDef,
        conditions: &[Condition],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let q = sql::update(entity, conditions, &patch);
        let rows = bind(&q)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(entity.table, e))?;
        Ok(rows.iter().map(row_to_map).collect())
    }

    async fn delete(&self, entity: &'static EntityDef, conditions: &[Condition]) -> Result<u64, StoreError> {
        let q = sql::delete(entity, conditions);
        let done = bind(&q)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(entity.table, e))?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_map(row: &PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

/// Probe the column's decoded type in turn. Timestamps render as RFC 3339, dates as `YYYY-MM-DD`.
fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(v)) = row.try_get::<Option<Value>, _>(name) {
        return v;
    }
    Value::Null
}
