//! Request body keys arrive camelCase from the dashboard; columns are snake_case.

use serde_json::{Map, Value};

/// "shelfLifeDays" -> "shelf_life_days", "skuID" -> "sku_id". Snake-case input is unchanged.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p == '_' => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map_or(false, char::is_lowercase),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Rename top-level keys to snake_case. When both spellings are sent, the snake_case one wins.
pub fn object_keys_to_snake_case(obj: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(obj.len());
    let mut renamed = Vec::new();
    for (k, v) in obj {
        let snake = to_snake_case(&k);
        if snake == k {
            out.insert(k, v);
        } else {
            renamed.push((snake, v));
        }
    }
    for (k, v) in renamed {
        out.entry(k).or_insert(v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_camel_case() {
        assert_eq!(to_snake_case("shelfLifeDays"), "shelf_life_days");
        assert_eq!(to_snake_case("reroutesIn"), "reroutes_in");
        assert_eq!(to_snake_case("skuID"), "sku_id");
        assert_eq!(to_snake_case("typeOfDay"), "type_of_day");
        assert_eq!(to_snake_case("store_id"), "store_id");
    }

    #[test]
    fn explicit_snake_key_wins() {
        let obj = match json!({"skuId": "A", "sku_id": "B", "name": "Milk"}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        let out = object_keys_to_snake_case(obj);
        assert_eq!(out.get("sku_id"), Some(&json!("B")));
        assert_eq!(out.len(), 2);
    }
}
