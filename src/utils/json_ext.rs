//! JSON manipulation helpers, grounded on `weavegraph::utils::json_ext`.

use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStrategy {
    PreferLeft,
    PreferRight,
    DeepMerge,
}

/// Recursively merges `right` into `left` according to `strategy`. Objects
/// merge key-by-key; any other value pair resolves per `strategy`.
#[must_use]
pub fn deep_merge(left: &Value, right: &Value, strategy: MergeStrategy) -> Value {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let mut merged: Map<String, Value> = l.clone();
            for (key, rv) in r {
                match merged.get(key) {
                    Some(lv) => {
                        let combined = deep_merge(lv, rv, strategy);
                        merged.insert(key.clone(), combined);
                    }
                    None => {
                        merged.insert(key.clone(), rv.clone());
                    }
                }
            }
            Value::Object(merged)
        }
        (Value::Array(l), Value::Array(r)) if strategy == MergeStrategy::DeepMerge => {
            let mut combined = l.clone();
            combined.extend(r.clone());
            Value::Array(combined)
        }
        _ => match strategy {
            MergeStrategy::PreferLeft => left.clone(),
            MergeStrategy::PreferRight | MergeStrategy::DeepMerge => right.clone(),
        },
    }
}

/// Reads a dot-separated path out of a JSON value, e.g. `get_by_path(v,
/// "a.b.0.c")`. Returns `None` if any segment is missing or of the wrong
/// shape.
#[must_use]
pub fn get_by_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

pub trait JsonValueExt {
    fn is_empty_container(&self) -> bool;
    fn element_count(&self) -> usize;
}

impl JsonValueExt for Value {
    fn is_empty_container(&self) -> bool {
        match self {
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    fn element_count(&self) -> usize {
        match self {
            Value::Object(map) => map.len(),
            Value::Array(items) => items.len(),
            Value::Null => 0,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_combines_nested_objects() {
        let left = json!({"a": {"x": 1}, "b": 2});
        let right = json!({"a": {"y": 2}, "c": 3});
        let merged = deep_merge(&left, &right, MergeStrategy::DeepMerge);
        assert_eq!(merged["a"]["x"], 1);
        assert_eq!(merged["a"]["y"], 2);
        assert_eq!(merged["c"], 3);
    }

    #[test]
    fn get_by_path_walks_nested_structures() {
        let value = json!({"a": {"items": [1, 2, {"c": "found"}]}});
        assert_eq!(get_by_path(&value, "a.items.2.c").unwrap(), "found");
        assert!(get_by_path(&value, "a.missing").is_none());
    }
}
