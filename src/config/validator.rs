//! Consistency checks over the table definitions, run once at startup.

use crate::config::EntityDef;
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(entities: &[&EntityDef]) -> Result<(), ConfigError> {
    let mut tables = HashSet::new();
    for e in entities {
        if !tables.insert(e.table) {
            return Err(ConfigError::DuplicateTable(e.table.to_string()));
        }
        if e.pk_columns.is_empty() {
            return Err(ConfigError::InvalidPrimaryKey {
                table: e.table.to_string(),
                column: String::new(),
            });
        }
        for pk in e.pk_columns {
            if !e.has_column(pk) {
                return Err(ConfigError::InvalidPrimaryKey {
                    table: e.table.to_string(),
                    column: (*pk).to_string(),
                });
            }
        }
        for (col, _) in e.default_order {
            if !e.has_column(col) {
                return Err(ConfigError::MissingReference {
                    kind: "order column",
                    id: format!("{}.{}", e.table, col),
                });
            }
        }
        for (col, _) in e.validation {
            if !e.has_column(col) {
                return Err(ConfigError::MissingReference {
                    kind: "validated column",
                    id: format!("{}.{}", e.table, col),
                });
            }
        }
        for inc in e.includes {
            if !e.has_column(inc.our_key) || !inc.related.has_column(inc.their_key) {
                return Err(ConfigError::MissingReference {
                    kind: "include",
                    id: format!("{} -> {}", e.table, inc.related.table),
                });
            }
        }
    }

    for e in entities {
        for c in e.columns {
            if let Some(fk) = c.references {
                let parent = entities.iter().find(|p| p.table == fk.table).ok_or_else(|| {
                    ConfigError::MissingReference {
                        kind: "table",
                        id: fk.table.to_string(),
                    }
                })?;
                if !parent.has_column(fk.column) {
                    return Err(ConfigError::MissingReference {
                        kind: "column",
                        id: format!("{}.{}", fk.table, fk.column),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnDef, ColumnType, ALL_ENTITIES};

    #[test]
    fn shipped_tables_are_consistent() {
        validate(ALL_ENTITIES).unwrap();
    }

    static BROKEN: EntityDef = EntityDef {
        table: "broken",
        label: "Broken",
        pk_columns: &["missing"],
        columns: &[ColumnDef::new("present", ColumnType::Text)],
        includes: &[],
        default_order: &[],
        validation: &[],
    };

    #[test]
    fn primary_key_must_be_a_column() {
        let err = validate(&[&BROKEN]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrimaryKey { ref column, .. } if column == "missing"));
    }

    #[test]
    fn duplicate_tables_are_rejected() {
        let err = validate(&[&crate::config::SKUS, &crate::config::SKUS]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTable(_)));
    }
}
