//! Static table definitions: columns, primary keys, parent includes and write rules.
//!
//! One `EntityDef` per table drives SQL generation, DDL, the in-memory store and request
//! validation, so per-entity code never repeats query construction.

/// Column type as stored in PostgreSQL. Used for parameter casts and DDL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Boolean,
    Date,
    Timestamptz,
    Uuid,
}

impl ColumnType {
    pub fn pg_type(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Timestamptz => "timestamptz",
            ColumnType::Uuid => "uuid",
        }
    }
}

/// Value the store assigns when an insert omits the column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnDefault {
    Now,
    RandomUuid,
    Int(i64),
    Bool(bool),
    Text(&'static str),
}

impl ColumnDefault {
    /// SQL expression for DDL.
    pub fn sql(self) -> String {
        match self {
            ColumnDefault::Now => "NOW()".into(),
            ColumnDefault::RandomUuid => "gen_random_uuid()".into(),
            ColumnDefault::Int(n) => n.to_string(),
            ColumnDefault::Bool(b) => if b { "TRUE".into() } else { "FALSE".into() },
            ColumnDefault::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

/// Foreign key from a column to a parent table column.
#[derive(Clone, Copy, Debug)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete_cascade: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub default: Option<ColumnDefault>,
    /// Rendered as a `CHECK (col >= 0)` constraint.
    pub non_negative: bool,
    pub unique: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        ColumnDef {
            name,
            ty,
            nullable: false,
            default: None,
            non_negative: false,
            unique: false,
            references: None,
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn default(mut self, d: ColumnDefault) -> Self {
        self.default = Some(d);
        self
    }

    pub const fn non_negative(mut self) -> Self {
        self.non_negative = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some(ForeignKey {
            table,
            column,
            on_delete_cascade: true,
        });
        self
    }
}

/// Parent row attached inline to every read (eager fetch). Output key is the parent table name.
#[derive(Debug)]
pub struct IncludeDef {
    pub related: &'static EntityDef,
    /// Our foreign-key column.
    pub our_key: &'static str,
    /// Their primary-key column.
    pub their_key: &'static str,
}

/// Per-column request rule, checked before the row reaches the store.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidationRule {
    pub required: bool,
    pub minimum: Option<f64>,
    pub max_length: Option<u32>,
    pub pattern: Option<&'static str>,
    pub format: Option<&'static str>,
    pub allowed: Option<&'static [&'static str]>,
}

impl ValidationRule {
    pub const fn new() -> Self {
        ValidationRule {
            required: false,
            minimum: None,
            max_length: None,
            pattern: None,
            format: None,
            allowed: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    pub const fn max_length(mut self, n: u32) -> Self {
        self.max_length = Some(n);
        self
    }

    pub const fn pattern(mut self, p: &'static str) -> Self {
        self.pattern = Some(p);
        self
    }

    pub const fn format(mut self, f: &'static str) -> Self {
        self.format = Some(f);
        self
    }

    pub const fn allowed(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = Some(values);
        self
    }
}

#[derive(Debug)]
pub struct EntityDef {
    pub table: &'static str,
    /// Human label for messages, e.g. "SKU".
    pub label: &'static str,
    pub pk_columns: &'static [&'static str],
    pub columns: &'static [ColumnDef],
    pub includes: &'static [IncludeDef],
    /// (column, ascending) applied when a read names no order.
    pub default_order: &'static [(&'static str, bool)],
    /// Rules in declaration order; the first missing required field is reported.
    pub validation: &'static [(&'static str, ValidationRule)],
}

impl EntityDef {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn is_pk(&self, name: &str) -> bool {
        self.pk_columns.contains(&name)
    }

    pub fn rule(&self, name: &str) -> Option<&'static ValidationRule> {
        self.validation.iter().find(|(c, _)| *c == name).map(|(_, r)| r)
    }
}
