//! In-memory store with the same observable constraints as the PostgreSQL schema:
//! typed columns, defaults, not-null, non-negative checks, primary/unique keys, foreign keys
//! with cascading delete. Backs the router in tests.

use super::{Row, Store, StoreError};
use crate::config::{ColumnDefault, ColumnType, EntityDef, ALL_ENTITIES};
use crate::query::{Condition, OrderBy, Select};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::Mutex;

type Tables = HashMap<&'static str, Vec<Row>>;

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn invalid(entity: &EntityDef, column: &str, detail: impl Into<String>) -> StoreError {
    StoreError::InvalidValue {
        table: entity.table.to_string(),
        column: column.to_string(),
        detail: detail.into(),
    }
}

fn unknown(entity: &EntityDef, column: &str) -> StoreError {
    StoreError::UnknownColumn {
        table: entity.table.to_string(),
        column: column.to_string(),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

/// Convert a value to the column's canonical JSON form, the way a `$n::type` cast would.
fn coerce(entity: &EntityDef, column: &str, v: &Value) -> Result<Value, StoreError> {
    let col = entity.column(column).ok_or_else(|| unknown(entity, column))?;
    if v.is_null() {
        return Ok(Value::Null);
    }
    let bad = || invalid(entity, column, format!("{} is not a valid {}", v, col.ty.pg_type()));
    Ok(match col.ty {
        ColumnType::Text => match v {
            Value::String(s) => Value::String(s.clone()),
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            _ => return Err(bad()),
        },
        ColumnType::Integer => {
            let n = match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            match n.and_then(|n| i32::try_from(n).ok()) {
                Some(n) => Value::Number(n.into()),
                None => return Err(bad()),
            }
        }
        ColumnType::Boolean => match v {
            Value::Bool(b) => Value::Bool(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Value::Bool(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Value::Bool(false),
            _ => return Err(bad()),
        },
        ColumnType::Date => {
            let s = v.as_str().ok_or_else(bad)?;
            let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| parse_timestamp(s).map(|t| t.date_naive()))
                .ok_or_else(bad)?;
            Value::String(d.format("%Y-%m-%d").to_string())
        }
        ColumnType::Timestamptz => {
            let s = v.as_str().ok_or_else(bad)?;
            Value::String(parse_timestamp(s).ok_or_else(bad)?.to_rfc3339())
        }
        ColumnType::Uuid => {
            let s = v.as_str().ok_or_else(bad)?;
            Value::String(uuid::Uuid::parse_str(s).map_err(|_| bad())?.to_string())
        }
    })
}

fn default_value(d: ColumnDefault) -> Value {
    match d {
        ColumnDefault::Now => Value::String(Utc::now().to_rfc3339()),
        ColumnDefault::RandomUuid => Value::String(uuid::Uuid::new_v4().to_string()),
        ColumnDefault::Int(n) => Value::Number(n.into()),
        ColumnDefault::Bool(b) => Value::Bool(b),
        ColumnDefault::Text(s) => Value::String(s.to_string()),
    }
}

/// Compare two non-null canonical values of one column.
fn compare(ty: ColumnType, a: &Value, b: &Value) -> Ordering {
    match ty {
        ColumnType::Integer => a.as_i64().cmp(&b.as_i64()),
        ColumnType::Boolean => a.as_bool().cmp(&b.as_bool()),
        ColumnType::Timestamptz => {
            let (x, y) = (a.as_str().and_then(parse_timestamp), b.as_str().and_then(parse_timestamp));
            x.cmp(&y)
        }
        _ => a.as_str().unwrap_or_default().cmp(b.as_str().unwrap_or_default()),
    }
}

fn text_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Conditions with their values coerced to column types.
fn resolve(entity: &EntityDef, conditions: &[Condition]) -> Result<Vec<Condition>, StoreError> {
    conditions
        .iter()
        .map(|c| {
            if !entity.has_column(c.column()) {
                return Err(unknown(entity, c.column()));
            }
            Ok(match c {
                Condition::Eq(col, v) => Condition::Eq(col.clone(), coerce(entity, col, v)?),
                Condition::In(col, vs) => Condition::In(
                    col.clone(),
                    vs.iter().map(|v| coerce(entity, col, v)).collect::<Result<_, _>>()?,
                ),
                Condition::Gte(col, v) => Condition::Gte(col.clone(), coerce(entity, col, v)?),
                Condition::Lte(col, v) => Condition::Lte(col.clone(), coerce(entity, col, v)?),
                other => other.clone(),
            })
        })
        .collect()
}

fn matches(entity: &EntityDef, row: &Row, conditions: &[Condition]) -> bool {
    conditions.iter().all(|c| {
        let col = c.column();
        let ty = entity.column(col).map(|d| d.ty).unwrap_or(ColumnType::Text);
        let cell = row.get(col).unwrap_or(&Value::Null);
        match c {
            Condition::Eq(_, v) if v.is_null() => cell.is_null(),
            Condition::Eq(_, v) => !cell.is_null() && compare(ty, cell, v) == Ordering::Equal,
            Condition::In(_, vs) => !cell.is_null() && vs.iter().any(|v| compare(ty, cell, v) == Ordering::Equal),
            Condition::Gte(_, v) => !cell.is_null() && !v.is_null() && compare(ty, cell, v) != Ordering::Less,
            Condition::Lte(_, v) => !cell.is_null() && !v.is_null() && compare(ty, cell, v) != Ordering::Greater,
            Condition::ILike(_, term) => {
                !cell.is_null() && text_of(cell).to_lowercase().contains(&term.to_lowercase())
            }
            Condition::NotNull(_) => !cell.is_null(),
        }
    })
}

/// Nulls sort last ascending and first descending.
fn sort_rows(entity: &EntityDef, rows: &mut [Row], order: &[OrderBy]) {
    rows.sort_by(|a, b| {
        for o in order {
            let ty = entity.column(&o.column).map(|d| d.ty).unwrap_or(ColumnType::Text);
            let x = a.get(&o.column).unwrap_or(&Value::Null);
            let y = b.get(&o.column).unwrap_or(&Value::Null);
            let ord = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare(ty, x, y),
            };
            let ord = if o.ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn same_key(entity: &EntityDef, a: &Row, b: &Row) -> bool {
    entity.pk_columns.iter().all(|c| a.get(*c) == b.get(*c))
}

fn check_row(entity: &EntityDef, row: &Row) -> Result<(), StoreError> {
    for col in entity.columns {
        let v = row.get(col.name).unwrap_or(&Value::Null);
        if v.is_null() {
            if !col.nullable {
                return Err(StoreError::NotNullViolation {
                    table: entity.table.to_string(),
                    column: col.name.to_string(),
                });
            }
            continue;
        }
        if col.non_negative && v.as_i64().map_or(false, |n| n < 0) {
            return Err(StoreError::CheckViolation {
                table: entity.table.to_string(),
                detail: format!("{} must be >= 0", col.name),
            });
        }
    }
    Ok(())
}

fn check_references(tables: &Tables, entity: &EntityDef, row: &Row) -> Result<(), StoreError> {
    for col in entity.columns {
        let (Some(fk), Some(v)) = (col.references, row.get(col.name)) else {
            continue;
        };
        if v.is_null() {
            continue;
        }
        let found = tables
            .get(fk.table)
            .map_or(false, |rows| rows.iter().any(|r| r.get(fk.column) == Some(v)));
        if !found {
            return Err(StoreError::ForeignKeyViolation {
                table: entity.table.to_string(),
                detail: format!("{}={} is not present in {}", col.name, text_of(v), fk.table),
            });
        }
    }
    Ok(())
}

/// Primary key and unique columns of `row` against `others`.
fn check_unique<'a>(
    entity: &EntityDef,
    row: &Row,
    others: impl Iterator<Item = &'a Row> + Clone,
) -> Result<(), StoreError> {
    let dup = |detail: String| StoreError::UniqueViolation {
        table: entity.table.to_string(),
        detail,
    };
    if others.clone().any(|o| same_key(entity, o, row)) {
        return Err(dup(format!("key ({}) already exists", entity.pk_columns.join(", "))));
    }
    for col in entity.columns.iter().filter(|c| c.unique) {
        let v = row.get(col.name).unwrap_or(&Value::Null);
        if !v.is_null() && others.clone().any(|o| o.get(col.name) == Some(v)) {
            return Err(dup(format!("key ({})=({}) already exists", col.name, text_of(v))));
        }
    }
    Ok(())
}

fn attach_includes(tables: &Tables, entity: &EntityDef, row: &mut Row) {
    for inc in entity.includes {
        let parent = row.get(inc.our_key).and_then(|v| {
            tables
                .get(inc.related.table)
                .and_then(|rows| rows.iter().find(|r| r.get(inc.their_key) == Some(v)))
        });
        row.insert(
            inc.related.table.to_string(),
            parent.map(|p| Value::Object(p.clone())).unwrap_or(Value::Null),
        );
    }
}

/// Remove rows in tables whose cascading foreign keys point at `removed` rows of `entity`.
fn cascade(tables: &mut Tables, entity: &EntityDef, removed: &[Row]) {
    for child in ALL_ENTITIES.iter().copied() {
        for col in child.columns {
            let Some(fk) = col.references.filter(|fk| fk.table == entity.table && fk.on_delete_cascade) else {
                continue;
            };
            let keys: Vec<&Value> = removed.iter().filter_map(|r| r.get(fk.column)).collect();
            let Some(rows) = tables.get_mut(child.table) else {
                continue;
            };
            let (gone, kept): (Vec<Row>, Vec<Row>) = std::mem::take(rows)
                .into_iter()
                .partition(|r| r.get(col.name).map_or(false, |v| keys.contains(&v)));
            *rows = kept;
            if !gone.is_empty() {
                cascade(tables, child, &gone);
            }
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, entity: &'static EntityDef, select: &Select) -> Result<Vec<Row>, StoreError> {
        let conditions = resolve(entity, &select.conditions)?;
        if let Some(o) = select.order.iter().find(|o| !entity.has_column(&o.column)) {
            return Err(unknown(entity, &o.column));
        }
        let tables = self.tables.lock().await;
        let mut rows: Vec<Row> = tables
            .get(entity.table)
            .map(|rows| rows.iter().filter(|r| matches(entity, r, &conditions)).cloned().collect())
            .unwrap_or_default();
        sort_rows(entity, &mut rows, &select.order);
        let mut page: Vec<Row> = rows
            .into_iter()
            .skip(select.page.offset as usize)
            .take(select.page.limit as usize)
            .collect();
        if select.with_includes {
            for row in &mut page {
                attach_includes(&tables, entity, row);
            }
        }
        Ok(page)
    }

    async fn count(&self, entity: &'static EntityDef, conditions: &[Condition]) -> Result<u64, StoreError> {
        let conditions = resolve(entity, conditions)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .get(entity.table)
            .map_or(0, |rows| rows.iter().filter(|r| matches(entity, r, &conditions)).count()) as u64)
    }

    async fn insert(&self, entity: &'static EntityDef, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.lock().await;
        let mut pending: Vec<Row> = Vec::with_capacity(rows.len());
        for input in rows {
            if let Some(k) = input.keys().find(|k| !entity.has_column(k)) {
                return Err(unknown(entity, k));
            }
            let mut row = Row::new();
            for col in entity.columns {
                let v = match input.get(col.name) {
                    Some(v) => coerce(entity, col.name, v)?,
                    None => col.default.map(default_value).unwrap_or(Value::Null),
                };
                row.insert(col.name.to_string(), v);
            }
            check_row(entity, &row)?;
            let existing = tables.get(entity.table).map(|r| r.as_slice()).unwrap_or_default();
            check_unique(entity, &row, existing.iter().chain(pending.iter()))?;
            check_references(&tables, entity, &row)?;
            pending.push(row);
        }
        tables.entry(entity.table).or_default().extend(pending.iter().cloned());
        Ok(pending)
    }

    async fn update(
        &self,
        entity: &'static EntityDef,
        conditions: &[Condition],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let conditions = resolve(entity, conditions)?;
        let mut changes = Row::new();
        for (k, v) in &patch {
            if entity.is_pk(k) {
                continue;
            }
            changes.insert(k.clone(), coerce(entity, k, v)?);
        }
        let mut tables = self.tables.lock().await;
        let current = tables.get(entity.table).cloned().unwrap_or_default();
        let mut next = Vec::with_capacity(current.len());
        let mut updated = Vec::new();
        for row in &current {
            if !matches(entity, row, &conditions) {
                next.push(row.clone());
                continue;
            }
            let mut row = row.clone();
            for (k, v) in &changes {
                row.insert(k.clone(), v.clone());
            }
            check_row(entity, &row)?;
            check_references(&tables, entity, &row)?;
            updated.push(row.clone());
            next.push(row);
        }
        if !changes.is_empty() {
            for row in &updated {
                let others = next.iter().filter(|o| !same_key(entity, o, row));
                for col in entity.columns.iter().filter(|c| c.unique && changes.contains_key(c.name)) {
                    let v = row.get(col.name).unwrap_or(&Value::Null);
                    if !v.is_null() && others.clone().any(|o| o.get(col.name) == Some(v)) {
                        return Err(StoreError::UniqueViolation {
                            table: entity.table.to_string(),
                            detail: format!("key ({})=({}) already exists", col.name, text_of(v)),
                        });
                    }
                }
            }
            tables.insert(entity.table, next);
        }
        Ok(updated)
    }

    async fn delete(&self, entity: &'static EntityDef, conditions: &[Condition]) -> Result<u64, StoreError> {
        let conditions = resolve(entity, conditions)?;
        let mut tables = self.tables.lock().await;
        let Some(rows) = tables.get_mut(entity.table) else {
            return Ok(0);
        };
        let (gone, kept): (Vec<Row>, Vec<Row>) = std::mem::take(rows)
            .into_iter()
            .partition(|r| matches(entity, r, &conditions));
        *rows = kept;
        cascade(&mut tables, entity, &gone);
        Ok(gone.len() as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
