use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use humansize::{BINARY, format_size};
use serde_json::{Map, Number, Value};

use super::TableKeys;
use crate::grid::{Attribute, Item};

/// Convert a DynamoDB item into a grid item.
///
/// Key attributes form the identifier and are not repeated as attributes.
/// The remaining attributes are emitted in name order; set values expand into
/// one attribute per element, all sharing the set's name.
pub fn to_grid_item(item: &HashMap<String, AttributeValue>, keys: &TableKeys) -> Item {
    let mut names: Vec<&String> = item.keys().filter(|name| !keys.is_key(name)).collect();
    names.sort();

    let mut attributes = Vec::with_capacity(names.len());
    for name in names {
        flatten_value(name, &item[name], &mut attributes);
    }

    Item {
        identifier: keys.identifier(item),
        attributes,
    }
}

fn flatten_value(name: &str, value: &AttributeValue, out: &mut Vec<Attribute>) {
    match value {
        AttributeValue::Ss(set) => {
            out.extend(set.iter().map(|s| Attribute::new(name, s.clone())));
        }
        AttributeValue::Ns(set) => {
            out.extend(set.iter().map(|n| Attribute::new(name, n.clone())));
        }
        AttributeValue::Bs(set) => {
            out.extend(
                set.iter()
                    .map(|b| Attribute::new(name, binary_label(b.as_ref().len()))),
            );
        }
        other => out.push(Attribute::new(name, render_scalar(other))),
    }
}

/// Single-cell rendering of a value. Lists and maps become compact JSON.
pub fn render_scalar(value: &AttributeValue) -> String {
    match value {
        AttributeValue::S(text) => text.clone(),
        AttributeValue::N(num) => num.clone(),
        AttributeValue::Bool(flag) => flag.to_string(),
        AttributeValue::Null(_) => "NULL".to_string(),
        AttributeValue::B(bytes) => binary_label(bytes.as_ref().len()),
        AttributeValue::L(_) | AttributeValue::M(_) => to_json_value(value).to_string(),
        AttributeValue::Ss(set) => Value::from(set.clone()).to_string(),
        AttributeValue::Ns(set) => Value::from(set.clone()).to_string(),
        AttributeValue::Bs(set) => Value::from(
            set.iter()
                .map(|b| binary_label(b.as_ref().len()))
                .collect::<Vec<_>>(),
        )
        .to_string(),
        other => format!("{other:?}"),
    }
}

fn to_json_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(text) => Value::String(text.clone()),
        AttributeValue::N(num) => num
            .parse::<i64>()
            .ok()
            .map(Number::from)
            .or_else(|| num.parse::<f64>().ok().and_then(Number::from_f64))
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(num.clone())),
        AttributeValue::Bool(flag) => Value::Bool(*flag),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(list) => Value::Array(list.iter().map(to_json_value).collect()),
        AttributeValue::M(map) => {
            let mut names: Vec<&String> = map.keys().collect();
            names.sort();
            let mut object = Map::with_capacity(map.len());
            for name in names {
                object.insert(name.clone(), to_json_value(&map[name]));
            }
            Value::Object(object)
        }
        other => Value::String(render_scalar(other)),
    }
}

fn binary_label(len: usize) -> String {
    format!("<binary {}>", format_size(len as u64, BINARY))
}
