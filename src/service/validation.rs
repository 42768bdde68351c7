//! Request validation from per-entity rules.

use crate::config::{ColumnType, EntityDef, ValidationRule};
use crate::error::AppError;
use crate::store::Row;
use regex::Regex;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a full row for insert. Required fields are checked in declared order, so the
    /// first missing one is reported. Values are checked against the column type;
    /// integer and boolean strings are normalized.
    pub fn validate(entity: &EntityDef, body: Row) -> Result<Row, AppError> {
        reject_unknown(entity, &body)?;
        for (col, rule) in entity.validation {
            if rule.required && is_blank(body.get(*col)) {
                return Err(AppError::Validation(format!("{} is required", col)));
            }
        }
        normalize(entity, body)
    }

    /// Validate only the fields present (updates). Required is not enforced for missing fields,
    /// but a required field cannot be cleared.
    pub fn validate_partial(entity: &EntityDef, body: Row) -> Result<Row, AppError> {
        reject_unknown(entity, &body)?;
        for (col, v) in &body {
            if entity.rule(col).map_or(false, |r| r.required) && is_blank(Some(v)) && !entity.is_pk(col) {
                return Err(AppError::Validation(format!("{} cannot be empty", col)));
            }
        }
        normalize(entity, body)
    }

    /// Validate every element before anything is written; the first failure names its index.
    pub fn validate_batch(entity: &EntityDef, items: Vec<Row>) -> Result<Vec<Row>, AppError> {
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                Self::validate(entity, item).map_err(|e| match e {
                    AppError::Validation(msg) => AppError::Validation(format!("record {}: {}", i, msg)),
                    other => other,
                })
            })
            .collect()
    }
}

fn is_blank(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

fn reject_unknown(entity: &EntityDef, body: &Row) -> Result<(), AppError> {
    match body.keys().find(|k| !entity.has_column(k)) {
        Some(k) => Err(AppError::Validation(format!("unknown field: {}", k))),
        None => Ok(()),
    }
}

/// Type-check every present column against its SQL type, then apply its rule.
fn normalize(entity: &EntityDef, mut body: Row) -> Result<Row, AppError> {
    for (col, v) in body.iter_mut() {
        let Some(def) = entity.column(col) else {
            continue;
        };
        if v.is_null() {
            if !def.nullable {
                return Err(AppError::Validation(format!("{} cannot be null", col)));
            }
            continue;
        }
        *v = check_type(col, def.ty, v)?;
        if let Some(rule) = entity.rule(col) {
            validate_field(col, v, rule)?;
        }
    }
    Ok(body)
}

/// Value in the form the column accepts. Integers must fit PostgreSQL `integer` (32-bit).
fn check_type(col: &str, ty: ColumnType, v: &Value) -> Result<Value, AppError> {
    let fail = |what: &str| AppError::Validation(format!("{} must be {}", col, what));
    match ty {
        ColumnType::Text => match v {
            Value::String(_) => Ok(v.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            _ => Err(fail("a string")),
        },
        ColumnType::Integer => {
            let n = match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| fail("an integer"))?;
            let n = i32::try_from(n).map_err(|_| {
                AppError::Validation(format!("{} must be between {} and {}", col, i32::MIN, i32::MAX))
            })?;
            Ok(Value::Number(n.into()))
        }
        ColumnType::Boolean => match v {
            Value::Bool(_) => Ok(v.clone()),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(fail("a boolean")),
        },
        ColumnType::Date => match v.as_str() {
            Some(s) if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => Ok(v.clone()),
            _ => Err(fail("a date (YYYY-MM-DD)")),
        },
        ColumnType::Timestamptz => match v.as_str() {
            Some(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => Ok(v.clone()),
            _ => Err(fail("an RFC 3339 timestamp")),
        },
        ColumnType::Uuid => match v.as_str() {
            Some(s) if uuid::Uuid::parse_str(s).is_ok() => Ok(v.clone()),
            _ => Err(fail("a valid UUID")),
        },
    }
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if let Some(format) = rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
    }
    if let Some(pattern) = rule.pattern {
        let re = Regex::new(pattern).map_err(|_| AppError::Validation(format!("invalid pattern for {}", col)))?;
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(allowed) = rule.allowed {
        if !v.as_str().map_or(false, |s| allowed.contains(&s)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {}",
                col,
                allowed.join(", ")
            )));
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
    }
    Ok(())
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    let Some(s) = v.as_str() else {
        return Err(AppError::Validation(format!("{} must be a string", col)));
    };
    match format {
        "email" => {
            if !s.contains('@') || s.len() < 3 {
                return Err(AppError::Validation(format!("{} must be a valid email", col)));
            }
        }
        "uuid" => {
            if uuid::Uuid::parse_str(s).is_err() {
                return Err(AppError::Validation(format!("{} must be a valid UUID", col)));
            }
        }
        "date" => {
            if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() {
                return Err(AppError::Validation(format!("{} must be a date (YYYY-MM-DD)", col)));
            }
        }
        _ => {}
    }
    Ok(())
}
