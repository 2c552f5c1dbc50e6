use serde_json::{Map, Value, json};

use super::AggregationResult;

/// Wire shape consumed by the item browser:
///
/// ```text
/// { "attr":  { "<key>": { "name": "...", "size": n }, ... },
///   "items": [ { "<key>": "<value>", ... }, ... ],
///   "meta":  { "pages": n, "truncated": bool } }
/// ```
///
/// `attr` keeps registry order; each item only lists the columns it populates.
pub fn to_json(result: &AggregationResult) -> Value {
    let mut attr = Map::with_capacity(result.registry.len());
    for (key, info) in result.registry.iter() {
        attr.insert(
            key.wire_key(),
            json!({ "name": info.display_name, "size": info.max_width }),
        );
    }

    let items = result
        .rows
        .iter()
        .map(|row| {
            let mut object = Map::with_capacity(row.len());
            for key in result.registry.keys() {
                if let Some(value) = row.get(key) {
                    object.insert(key.wire_key(), Value::String(value.to_string()));
                }
            }
            Value::Object(object)
        })
        .collect();

    json!({
        "attr": Value::Object(attr),
        "items": Value::Array(items),
        "meta": { "pages": result.pages_fetched, "truncated": result.truncated },
    })
}

pub fn to_json_string(result: &AggregationResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&to_json(result))
}
