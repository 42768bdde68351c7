//! Database bootstrap: create the database, apply table DDL, optionally seed demo rows.
//! Table order follows foreign-key dependencies (parents first, see `ALL_ENTITIES`).

use crate::config::{ColumnDef, ColumnDefault, EntityDef, ALL_ENTITIES};
use crate::error::{AppError, ConfigError};
use crate::service::Services;
use crate::store::{Row, StoreError};
use serde_json::{json, Value};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn db(e: sqlx::Error) -> AppError {
    AppError::Store(StoreError::Database(e))
}

fn column_ddl(c: &ColumnDef) -> String {
    let mut def = format!("{} {}", quote(c.name), c.ty.pg_type());
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(d) = c.default {
        def.push_str(" DEFAULT ");
        def.push_str(&d.sql());
    }
    if c.unique {
        def.push_str(" UNIQUE");
    }
    if c.non_negative {
        def.push_str(&format!(" CHECK ({} >= 0)", quote(c.name)));
    }
    def
}

/// `CREATE TABLE IF NOT EXISTS` for one entity, constraints inline.
pub fn table_ddl(entity: &EntityDef) -> String {
    let mut parts: Vec<String> = entity.columns.iter().map(column_ddl).collect();
    let pk: Vec<String> = entity.pk_columns.iter().map(|c| quote(c)).collect();
    parts.push(format!("PRIMARY KEY ({})", pk.join(", ")));
    for c in entity.columns {
        if let Some(fk) = c.references {
            let on_delete = if fk.on_delete_cascade { " ON DELETE CASCADE" } else { "" };
            parts.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}){}",
                quote(c.name),
                quote(fk.table),
                quote(fk.column),
                on_delete
            ));
        }
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quote(entity.table),
        parts.join(",\n  ")
    )
}

/// Lookup indexes on foreign-key columns that do not lead the primary key.
pub fn index_ddl(entity: &EntityDef) -> Vec<String> {
    let leading = entity.pk_columns.first().copied();
    entity
        .columns
        .iter()
        .filter(|c| c.references.is_some() && Some(c.name) != leading)
        .map(|c| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote(&format!("idx_{}_{}", entity.table, c.name)),
                quote(entity.table),
                quote(c.name)
            )
        })
        .collect()
}

/// Every DDL statement for the given tables, in execution order.
pub fn schema_statements(entities: &[&EntityDef]) -> Vec<String> {
    let mut out: Vec<String> = entities.iter().map(|e| table_ddl(e)).collect();
    out.extend(entities.iter().flat_map(|e| index_ddl(e)));
    out
}

fn needs_random_uuid(entities: &[&EntityDef]) -> bool {
    entities
        .iter()
        .flat_map(|e| e.columns.iter())
        .any(|c| c.default == Some(ColumnDefault::RandomUuid))
}

/// Apply DDL for every table. Idempotent (IF NOT EXISTS throughout).
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    if needs_random_uuid(ALL_ENTITIES) {
        // Built in from PostgreSQL 13; the extension covers older servers.
        if let Err(e) = sqlx::query("CREATE EXTENSION IF NOT EXISTS pgcrypto").execute(pool).await {
            tracing::warn!(error = %e, "could not enable pgcrypto");
        }
    }
    for sql in schema_statements(ALL_ENTITIES) {
        tracing::debug!(%sql, "migration");
        sqlx::query(&sql).execute(pool).await.map_err(db)?;
    }
    tracing::info!(tables = ALL_ENTITIES.len(), "migrations applied");
    Ok(())
}

/// Create the target database when missing, via the `postgres` maintenance database.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| ConfigError::InvalidValue("DATABASE_URL", e.to_string()))?;
    let mut conn = opts.connect().await.map_err(db)?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await
        .map_err(db)?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(db)?;
        tracing::info!(database = %db_name, "database created");
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url
        .get(scheme_end..)
        .and_then(|rest| rest.find('/'))
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| ConfigError::InvalidValue("DATABASE_URL", "no database path".into()))?;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let mut split = path_and_query.splitn(2, '?');
    let db_name = split.next().unwrap_or("").trim().to_string();
    let query = split.next().map(|q| format!("?{}", q)).unwrap_or_default();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres{}", base, query), db_name))
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(m) => m,
        _ => Row::new(),
    }
}

fn skip_conflict<T>(result: Result<T, AppError>) -> Result<bool, AppError> {
    match result {
        Ok(_) => Ok(true),
        Err(AppError::Conflict(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Insert a small demo data set. Rows that already exist are left alone.
pub async fn seed_sample_data(services: &Services) -> Result<(), AppError> {
    let mut inserted = 0usize;
    for (id, name, days) in [("K1", "Milk 1L", 7), ("K2", "Bread Loaf", 3), ("K3", "Eggs Dozen", 14)] {
        let sku = row(json!({ "sku_id": id, "name": name, "shelf_life_days": days }));
        inserted += skip_conflict(services.skus.crud().create(sku).await)? as usize;
    }
    for (id, geo, religion) in [("S1", "New York", "Christian"), ("S2", "Los Angeles", "Jewish")] {
        let store = row(json!({ "store_id": id, "geo": geo, "religion": religion }));
        inserted += skip_conflict(services.stores.crud().create(store).await)? as usize;
    }
    for (store_id, sku_id) in [("S1", "K1"), ("S1", "K2"), ("S2", "K1"), ("S2", "K3")] {
        inserted += skip_conflict(services.store_skus.create(store_id, sku_id).await)? as usize;
    }
    let sale = row(json!({
        "store_id": "S1",
        "sku_id": "K1",
        "year": 2024,
        "day": 1,
        "date": "2024-01-01",
        "type_of_day": "weekday",
        "initial": 100,
        "sold": 45,
        "returns": 2,
        "donations": 1,
        "reroutes_in": 5,
        "reroutes_out": 3,
        "recycled": 0,
        "final": 54
    }));
    inserted += skip_conflict(services.sales_data.create(sale).await)? as usize;
    tracing::info!(inserted, "sample data seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PROFILES, SALES_DATA, SKUS, STORE_SKUS};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn sku_table_has_defaults_and_check() {
        let sql = table_ddl(&SKUS);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"skus\""));
        assert!(sql.contains("\"sku_id\" text NOT NULL"));
        assert!(sql.contains("\"shelf_life_days\" integer NOT NULL DEFAULT 0 CHECK (\"shelf_life_days\" >= 0)"));
        assert!(sql.contains("\"created_at\" timestamptz NOT NULL DEFAULT NOW()"));
        assert!(sql.contains("PRIMARY KEY (\"sku_id\")"));
    }

    #[test]
    fn child_tables_cascade_to_parents() {
        let sql = table_ddl(&SALES_DATA);
        assert!(sql.contains("PRIMARY KEY (\"store_id\", \"sku_id\", \"year\", \"day\")"));
        assert!(sql.contains("FOREIGN KEY (\"store_id\") REFERENCES \"stores\" (\"store_id\") ON DELETE CASCADE"));
        assert!(sql.contains("FOREIGN KEY (\"sku_id\") REFERENCES \"skus\" (\"sku_id\") ON DELETE CASCADE"));
        assert!(sql.contains("\"type_of_day\" text,") || sql.contains("\"type_of_day\" text\n"));
    }

    #[test]
    fn profiles_get_uuid_default_and_unique_email() {
        let sql = table_ddl(&PROFILES);
        assert!(sql.contains("\"id\" uuid NOT NULL DEFAULT gen_random_uuid()"));
        assert!(sql.contains("\"email\" text NOT NULL UNIQUE"));
        assert!(sql.contains("\"role\" text NOT NULL DEFAULT 'user'"));
        assert!(needs_random_uuid(&[&PROFILES]));
        assert!(!needs_random_uuid(&[&SKUS]));
    }

    #[test]
    fn indexes_skip_the_leading_key_column() {
        let idx = index_ddl(&STORE_SKUS);
        assert_eq!(idx.len(), 1);
        assert!(idx[0].contains("\"idx_store_skus_sku_id\""));
        assert!(index_ddl(&SKUS).is_empty());
    }

    #[test]
    fn tables_precede_indexes() {
        let stmts = schema_statements(ALL_ENTITIES);
        let first_index = stmts.iter().position(|s| s.starts_with("CREATE INDEX")).unwrap();
        assert_eq!(first_index, ALL_ENTITIES.len());
    }

    #[test]
    fn admin_url_swaps_database_name() {
        let (admin, name) = parse_db_name_from_url("postgres://u:p@localhost:5432/inventory?sslmode=disable").unwrap();
        assert_eq!(name, "inventory");
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres?sslmode=disable");
        let err = parse_db_name_from_url("postgres://localhost").unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::InvalidValue("DATABASE_URL", _))));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn seeding_twice_is_harmless() {
        let services = Services::new(Arc::new(MemoryStore::new()));
        seed_sample_data(&services).await.unwrap();
        seed_sample_data(&services).await.unwrap();
        assert_eq!(services.skus.crud().count(&[]).await.unwrap(), 3);
        assert_eq!(services.store_skus.crud().count(&[]).await.unwrap(), 4);
        assert_eq!(services.sales_data.crud().count(&[]).await.unwrap(), 1);
    }
}
