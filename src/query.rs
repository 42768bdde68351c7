//! Read-query options (filters, order, pagination) and their resolved form.

use crate::config::EntityDef;
use crate::error::AppError;
use serde::Deserialize;
use serde_json::Value;

/// Upper bound on rows returned by one read.
pub const MAX_LIMIT: u32 = 1000;

/// Equality for a scalar, inclusion for a list.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Eq(Value),
    In(Vec<Value>),
}

impl From<Value> for FilterValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Array(items) => FilterValue::In(items),
            other => FilterValue::Eq(other),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        OrderBy {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        OrderBy {
            column: column.into(),
            ascending: false,
        }
    }
}

/// One predicate on a column. Column names are not checked here; the store rejects unknown ones.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lte(String, Value),
    /// Case-insensitive substring match.
    ILike(String, String),
    NotNull(String),
}

impl Condition {
    pub fn column(&self) -> &str {
        match self {
            Condition::Eq(c, _)
            | Condition::In(c, _)
            | Condition::Gte(c, _)
            | Condition::Lte(c, _)
            | Condition::ILike(c, _)
            | Condition::NotNull(c) => c,
        }
    }

    pub fn eq(column: impl Into<String>, v: impl Into<Value>) -> Self {
        Condition::Eq(column.into(), v.into())
    }

    pub fn from_filter(column: &str, value: &FilterValue) -> Self {
        match value {
            FilterValue::Eq(v) => Condition::Eq(column.to_string(), v.clone()),
            FilterValue::In(vs) => Condition::In(column.to_string(), vs.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            limit: MAX_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryOptions {
    pub filters: Vec<(String, FilterValue)>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((column.into(), FilterValue::Eq(value.into())));
        self
    }

    pub fn filter_in(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.filters.push((column.into(), FilterValue::In(values)));
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u32) -> Self {
        self.offset = Some(n);
        self
    }

    /// Limit defaults to (and is clamped at) `MAX_LIMIT`; offset never implies a page size.
    pub fn page(&self) -> Page {
        Page {
            limit: self.limit.unwrap_or(MAX_LIMIT).min(MAX_LIMIT),
            offset: self.offset.unwrap_or(0),
        }
    }

    pub fn conditions(&self) -> Vec<Condition> {
        self.filters
            .iter()
            .map(|(col, v)| Condition::from_filter(col, v))
            .collect()
    }
}

/// Fully resolved read handed to a store.
#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    pub conditions: Vec<Condition>,
    pub order: Vec<OrderBy>,
    pub page: Page,
    /// Attach the entity's parent rows inline.
    pub with_includes: bool,
}

impl Select {
    /// Applies the entity's default order when the options name none, then breaks ties by primary key.
    pub fn from_options(entity: &EntityDef, options: &QueryOptions) -> Self {
        let mut order = match &options.order_by {
            Some(o) => vec![o.clone()],
            None => default_order(entity),
        };
        append_pk_tiebreak(entity, &mut order);
        Select {
            conditions: options.conditions(),
            order,
            page: options.page(),
            with_includes: !entity.includes.is_empty(),
        }
    }

    pub fn new(entity: &EntityDef, conditions: Vec<Condition>) -> Self {
        let mut order = default_order(entity);
        append_pk_tiebreak(entity, &mut order);
        Select {
            conditions,
            order,
            page: Page::default(),
            with_includes: !entity.includes.is_empty(),
        }
    }

    pub fn ordered(mut self, entity: &EntityDef, order: OrderBy) -> Self {
        self.order = vec![order];
        append_pk_tiebreak(entity, &mut self.order);
        self
    }

    pub fn limit(mut self, limit: Option<u32>) -> Self {
        if let Some(n) = limit {
            self.page.limit = n.min(MAX_LIMIT);
        }
        self
    }

    /// Limit and offset from request options.
    pub fn paged(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    /// Every matching row; for server-side aggregates only.
    pub fn unpaged(mut self) -> Self {
        self.page = Page {
            limit: u32::MAX,
            offset: 0,
        };
        self
    }

    pub fn without_includes(mut self) -> Self {
        self.with_includes = false;
        self
    }
}

fn default_order(entity: &EntityDef) -> Vec<OrderBy> {
    entity
        .default_order
        .iter()
        .map(|(col, asc)| OrderBy {
            column: (*col).to_string(),
            ascending: *asc,
        })
        .collect()
}

fn append_pk_tiebreak(entity: &EntityDef, order: &mut Vec<OrderBy>) {
    for pk in entity.pk_columns {
        if !order.iter().any(|o| o.column == *pk) {
            order.push(OrderBy::asc(*pk));
        }
    }
}

/// Primary key values in `EntityDef::pk_columns` order.
#[derive(Clone, Debug, PartialEq)]
pub struct Key(pub Vec<Value>);

impl Key {
    pub fn single(v: impl Into<Value>) -> Self {
        Key(vec![v.into()])
    }

    pub fn conditions(&self, entity: &EntityDef) -> Result<Vec<Condition>, AppError> {
        if self.0.len() != entity.pk_columns.len() {
            return Err(AppError::BadRequest(format!(
                "{} key has {} part(s), got {}",
                entity.label,
                entity.pk_columns.len(),
                self.0.len()
            )));
        }
        Ok(entity
            .pk_columns
            .iter()
            .zip(&self.0)
            .map(|(col, v)| Condition::Eq((*col).to_string(), v.clone()))
            .collect())
    }

    /// Human form for messages, e.g. `S1/K1/2024/1`.
    pub fn display(&self) -> String {
        self.0
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SALES_DATA, SKUS};
    use serde_json::json;

    #[test]
    fn offset_without_limit_keeps_the_maximum_page() {
        let opts = QueryOptions::new().offset(20);
        assert_eq!(opts.page(), Page { limit: MAX_LIMIT, offset: 20 });
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(QueryOptions::new().limit(5000).page().limit, MAX_LIMIT);
        assert_eq!(QueryOptions::new().limit(2).offset(2).page(), Page { limit: 2, offset: 2 });
    }

    #[test]
    fn array_filters_become_inclusion() {
        let opts = QueryOptions::new()
            .filter("geo", "NY")
            .filter_in("store_id", vec![json!("S1"), json!("S2")]);
        assert_eq!(
            opts.conditions(),
            vec![
                Condition::Eq("geo".into(), json!("NY")),
                Condition::In("store_id".into(), vec![json!("S1"), json!("S2")]),
            ]
        );
        assert_eq!(FilterValue::from(json!([1, 2])), FilterValue::In(vec![json!(1), json!(2)]));
    }

    #[test]
    fn order_by_deserializes_with_ascending_default() {
        let o: OrderBy = serde_json::from_value(json!({"column": "name"})).unwrap();
        assert!(o.ascending);
    }

    #[test]
    fn sales_reads_default_to_newest_date_first() {
        let s = Select::from_options(&SALES_DATA, &QueryOptions::new());
        assert_eq!(s.order[0], OrderBy::desc("date"));
        assert!(s.with_includes);
    }

    #[test]
    fn explicit_order_gets_primary_key_tiebreak() {
        let s = Select::from_options(&SKUS, &QueryOptions::new().order_by(OrderBy::desc("name")));
        assert_eq!(s.order, vec![OrderBy::desc("name"), OrderBy::asc("sku_id")]);
        assert!(!s.with_includes);
    }

    #[test]
    fn key_arity_must_match() {
        let err = Key::single("S1").conditions(&SALES_DATA).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let key = Key(vec![json!("S1"), json!("K1"), json!(2024), json!(1)]);
        assert_eq!(key.conditions(&SALES_DATA).unwrap().len(), 4);
        assert_eq!(key.display(), "S1/K1/2024/1");
    }
}
