//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from an entity definition.
//! Identifiers are always quoted; every value travels as a bind parameter.

use crate::config::EntityDef;
use crate::query::{Condition, Select};
use crate::store::Row;
use serde_json::Value;

const MAIN_ALIAS: &str = "main";

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified(alias: Option<&str>, column: &str) -> String {
    match alias {
        Some(a) => format!("{}.{}", a, quoted(column)),
        None => quoted(column),
    }
}

/// Escape LIKE metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value and return its placeholder, cast to the column type when the column is known.
    fn bind(&mut self, entity: &EntityDef, column: &str, v: Value) -> String {
        self.params.push(v);
        let n = self.params.len();
        match entity.column(column) {
            Some(c) => format!("${}::{}", n, c.ty.pg_type()),
            None => format!("${}", n),
        }
    }
}

fn column_list(entity: &EntityDef, alias: Option<&str>) -> String {
    entity
        .columns
        .iter()
        .map(|c| match alias {
            Some(_) => format!("{} AS {}", qualified(alias, c.name), quoted(c.name)),
            None => quoted(c.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(q: &mut QueryBuf, entity: &EntityDef, conditions: &[Condition], alias: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(conditions.len());
    for cond in conditions {
        let col = qualified(alias, cond.column());
        let part = match cond {
            Condition::Eq(c, v) => {
                if v.is_null() {
                    format!("{} IS NULL", col)
                } else {
                    format!("{} = {}", col, q.bind(entity, c, v.clone()))
                }
            }
            Condition::In(c, vs) => {
                if vs.is_empty() {
                    "FALSE".to_string()
                } else {
                    let phs: Vec<String> = vs.iter().map(|v| q.bind(entity, c, v.clone())).collect();
                    format!("{} IN ({})", col, phs.join(", "))
                }
            }
            Condition::Gte(c, v) => format!("{} >= {}", col, q.bind(entity, c, v.clone())),
            Condition::Lte(c, v) => format!("{} <= {}", col, q.bind(entity, c, v.clone())),
            Condition::ILike(_, term) => {
                q.params.push(Value::String(format!("%{}%", escape_like(term))));
                format!("{} ILIKE ${}", col, q.params.len())
            }
            Condition::NotNull(_) => format!("{} IS NOT NULL", col),
        };
        parts.push(part);
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT with conditions, order and page. With includes, each parent row is a `row_to_json` scalar subquery.
pub fn select(entity: &EntityDef, select: &Select) -> QueryBuf {
    let mut q = QueryBuf::new();
    let alias = select.with_includes.then_some(MAIN_ALIAS);
    let mut select_parts = vec![column_list(entity, alias)];
    if select.with_includes {
        for inc in entity.includes {
            let rel = inc.related;
            select_parts.push(format!(
                "(SELECT row_to_json(sub) FROM (SELECT {} FROM {} WHERE {} = {}.{}) sub) AS {}",
                column_list(rel, None),
                quoted(rel.table),
                quoted(inc.their_key),
                MAIN_ALIAS,
                quoted(inc.our_key),
                quoted(rel.table)
            ));
        }
    }
    let from = match alias {
        Some(a) => format!("{} {}", quoted(entity.table), a),
        None => quoted(entity.table),
    };
    let where_sql = where_clause(&mut q, entity, &select.conditions, alias);
    let order_sql = if select.order.is_empty() {
        String::new()
    } else {
        let parts: Vec<String> = select
            .order
            .iter()
            .map(|o| format!("{} {}", qualified(alias, &o.column), if o.ascending { "ASC" } else { "DESC" }))
            .collect();
        format!(" ORDER BY {}", parts.join(", "))
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        select_parts.join(", "),
        from,
        where_sql,
        order_sql,
        select.page.limit,
        select.page.offset
    );
    q
}

pub fn count(entity: &EntityDef, conditions: &[Condition]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, entity, conditions, None);
    q.sql = format!("SELECT COUNT(*) AS count FROM {}{}", quoted(entity.table), where_sql);
    q
}

/// INSERT one row. Known columns go first in definition order; unknown keys are passed through
/// so the database rejects them. Omitted columns take their database default.
pub fn insert(entity: &EntityDef, row: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in entity.columns {
        if let Some(v) = row.get(c.name) {
            cols.push(quoted(c.name));
            placeholders.push(q.bind(entity, c.name, v.clone()));
        }
    }
    let mut unknown: Vec<&String> = row.keys().filter(|k| !entity.has_column(k)).collect();
    unknown.sort();
    for k in unknown {
        cols.push(quoted(k));
        placeholders.push(q.bind(entity, k, row[k.as_str()].clone()));
    }
    let returning = column_list(entity, None);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", quoted(entity.table), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(entity.table),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE matching rows, setting only the patch's non-key columns. An empty patch becomes a SELECT.
pub fn update(entity: &EntityDef, conditions: &[Condition], patch: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut keys: Vec<&String> = patch.keys().filter(|k| !entity.is_pk(k)).collect();
    keys.sort_by_key(|k| {
        entity
            .columns
            .iter()
            .position(|c| c.name == k.as_str())
            .unwrap_or(usize::MAX)
    });
    let sets: Vec<String> = keys
        .into_iter()
        .map(|k| format!("{} = {}", quoted(k), q.bind(entity, k, patch[k.as_str()].clone())))
        .collect();
    let returning = column_list(entity, None);
    if sets.is_empty() {
        let where_sql = where_clause(&mut q, entity, conditions, None);
        q.sql = format!("SELECT {} FROM {}{}", returning, quoted(entity.table), where_sql);
        return q;
    }
    let where_sql = where_clause(&mut q, entity, conditions, None);
    q.sql = format!(
        "UPDATE {} SET {}{} RETURNING {}",
        quoted(entity.table),
        sets.join(", "),
        where_sql,
        returning
    );
    q
}

pub fn delete(entity: &EntityDef, conditions: &[Condition]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, entity, conditions, None);
    q.sql = format!("DELETE FROM {}{}", quoted(entity.table), where_sql);
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SALES_DATA, SKUS, STORES};
    use crate::query::{Key, OrderBy, QueryOptions};
    use serde_json::json;

    fn row(v: Value) -> Row {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn select_binds_filters_and_paginates() {
        let opts = QueryOptions::new().filter("geo", "NY").limit(2).offset(2);
        let q = select(&STORES, &Select::from_options(&STORES, &opts));
        assert_eq!(
            q.sql,
            "SELECT \"store_id\", \"geo\", \"religion\", \"created_at\" FROM \"stores\" \
             WHERE \"geo\" = $1::text ORDER BY \"store_id\" ASC LIMIT 2 OFFSET 2"
        );
        assert_eq!(q.params, vec![json!("NY")]);
    }

    #[test]
    fn select_with_includes_embeds_parents() {
        let key = Key(vec![json!("S1"), json!("K1"), json!(2024), json!(1)]);
        let sel = Select::new(&SALES_DATA, key.conditions(&SALES_DATA).unwrap());
        let q = select(&SALES_DATA, &sel);
        assert!(q.sql.contains("FROM \"sales_data\" main WHERE main.\"store_id\" = $1::text"));
        assert!(q.sql.contains("main.\"year\" = $3::integer"));
        assert!(q.sql.contains(
            "(SELECT row_to_json(sub) FROM (SELECT \"store_id\", \"geo\", \"religion\", \"created_at\" \
             FROM \"stores\" WHERE \"store_id\" = main.\"store_id\") sub) AS \"stores\""
        ));
        assert!(q.sql.contains("ORDER BY main.\"date\" DESC"));
        assert_eq!(q.params.len(), 4);
    }

    #[test]
    fn unknown_columns_pass_through_unquoted_values_never_inline() {
        let sel = Select::new(&SKUS, vec![Condition::eq("colour", "red")]).ordered(&SKUS, OrderBy::asc("x\"y"));
        let q = select(&SKUS, &sel);
        assert!(q.sql.contains("WHERE \"colour\" = $1 "));
        assert!(q.sql.contains("ORDER BY \"x\"\"y\" ASC"));
        assert!(!q.sql.contains("red"));
    }

    #[test]
    fn ilike_escapes_wildcards() {
        let sel = Select::new(&SKUS, vec![Condition::ILike("name".into(), "50%_off".into())]);
        let q = select(&SKUS, &sel);
        assert!(q.sql.contains("\"name\" ILIKE $1"));
        assert_eq!(q.params, vec![json!("%50\\%\\_off%")]);
    }

    #[test]
    fn empty_inclusion_matches_nothing() {
        let q = count(&SKUS, &[Condition::In("sku_id".into(), vec![])]);
        assert_eq!(q.sql, "SELECT COUNT(*) AS count FROM \"skus\" WHERE FALSE");
    }

    #[test]
    fn insert_omits_defaulted_columns() {
        let q = insert(&SKUS, &row(json!({"name": "Milk", "sku_id": "K1"})));
        assert_eq!(
            q.sql,
            "INSERT INTO \"skus\" (\"sku_id\", \"name\") VALUES ($1::text, $2::text) \
             RETURNING \"sku_id\", \"name\", \"shelf_life_days\", \"created_at\""
        );
        assert_eq!(q.params, vec![json!("K1"), json!("Milk")]);
    }

    #[test]
    fn update_skips_key_columns_and_binds_key_last() {
        let conds = Key::single("K1").conditions(&SKUS).unwrap();
        let q = update(&SKUS, &conds, &row(json!({"sku_id": "K2", "shelf_life_days": 5, "name": "Milk"})));
        assert_eq!(
            q.sql,
            "UPDATE \"skus\" SET \"name\" = $1::text, \"shelf_life_days\" = $2::integer \
             WHERE \"sku_id\" = $3::text RETURNING \"sku_id\", \"name\", \"shelf_life_days\", \"created_at\""
        );
    }

    #[test]
    fn empty_update_reads_current_row() {
        let conds = Key::single("K1").conditions(&SKUS).unwrap();
        let q = update(&SKUS, &conds, &Row::new());
        assert!(q.sql.starts_with("SELECT "));
        assert_eq!(q.params, vec![json!("K1")]);
    }

    #[test]
    fn delete_by_key() {
        let conds = Key::single("S1").conditions(&STORES).unwrap();
        let q = delete(&STORES, &conds);
        assert_eq!(q.sql, "DELETE FROM \"stores\" WHERE \"store_id\" = $1::text");
    }
}
