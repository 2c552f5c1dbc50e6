use std::collections::HashMap;

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{AttributeValue, KeySchemaElement, KeyType, TableDescription};

use super::{AttributeType, format_sdk_error, render_scalar, send_dynamo_request};
use crate::grid::StoreError;

/// Separator between hash and range values in a composite identifier.
pub const IDENTIFIER_SEPARATOR: &str = ":";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attr_type: AttributeType,
}

/// Primary key layout of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableKeys {
    pub hash: KeyAttribute,
    pub range: Option<KeyAttribute>,
}

impl TableKeys {
    pub fn from_table_description(table_desc: &TableDescription) -> Result<Self, String> {
        let (hash, range) = extract_hash_range_from_schema(table_desc.key_schema());
        let hash = hash.ok_or_else(|| "table has no partition key".to_string())?;
        Ok(Self {
            hash: key_attribute(table_desc, hash)?,
            range: range.map(|name| key_attribute(table_desc, name)).transpose()?,
        })
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.hash.name == name || self.range.as_ref().is_some_and(|range| range.name == name)
    }

    /// Display identifier of an item: the rendered partition key value, joined
    /// with the rendered sort key value for composite keys.
    ///
    /// The separator is not escaped, so `("a:b", "c")` and `("a", "b:c")` both
    /// render as `a:b:c`, and binary keys render as a size label. Such items
    /// cannot be addressed through `--pk`/`--sk` from the identifier alone.
    pub fn identifier(&self, item: &HashMap<String, AttributeValue>) -> String {
        let render = |name: &str| item.get(name).map(render_scalar).unwrap_or_default();
        match &self.range {
            None => render(&self.hash.name),
            Some(range) => format!(
                "{}{IDENTIFIER_SEPARATOR}{}",
                render(&self.hash.name),
                render(&range.name)
            ),
        }
    }

    /// Build the primary key map addressing one item.
    pub fn key_for(
        &self,
        hash_value: &str,
        range_value: Option<&str>,
    ) -> Result<HashMap<String, AttributeValue>, String> {
        let mut key = HashMap::with_capacity(2);
        key.insert(self.hash.name.clone(), key_value(&self.hash, hash_value)?);
        match (&self.range, range_value) {
            (Some(range), Some(raw)) => {
                key.insert(range.name.clone(), key_value(range, raw)?);
            }
            (Some(range), None) => {
                return Err(format!("table requires a sort key value for {}", range.name));
            }
            (None, Some(_)) => return Err("table has no sort key".to_string()),
            (None, None) => {}
        }
        Ok(key)
    }
}

pub async fn describe_table(
    client: &Client,
    table_name: &str,
) -> Result<TableDescription, StoreError> {
    let span = tracing::trace_span!("DescribeTable", table = %table_name);
    let output = send_dynamo_request(
        span,
        || client.describe_table().table_name(table_name).send(),
        format_sdk_error,
    )
    .await
    .map_err(|err| StoreError::new(format_sdk_error(&err)))?;
    output
        .table
        .ok_or_else(|| StoreError::new(format!("table {table_name} has no description")))
}

fn key_attribute(table_desc: &TableDescription, name: String) -> Result<KeyAttribute, String> {
    let attr_type = table_desc
        .attribute_definitions()
        .iter()
        .find(|def| def.attribute_name() == name)
        .and_then(|def| AttributeType::from_scalar(def.attribute_type()))
        .ok_or_else(|| format!("no attribute definition for key {name}"))?;
    Ok(KeyAttribute { name, attr_type })
}

fn key_value(key: &KeyAttribute, raw: &str) -> Result<AttributeValue, String> {
    match key.attr_type {
        AttributeType::String => Ok(AttributeValue::S(raw.to_string())),
        AttributeType::Number => {
            let trimmed = raw.trim();
            if trimmed.parse::<f64>().is_err() {
                return Err(format!("{} expects a number, got {raw:?}", key.name));
            }
            Ok(AttributeValue::N(trimmed.to_string()))
        }
        AttributeType::Binary => Ok(AttributeValue::B(Blob::new(raw.as_bytes()))),
    }
}

pub(crate) fn extract_hash_range_from_schema(
    schema: &[KeySchemaElement],
) -> (Option<String>, Option<String>) {
    let mut hash = None;
    let mut range = None;

    for KeySchemaElement {
        attribute_name,
        key_type,
        ..
    } in schema
    {
        match key_type {
            KeyType::Hash => hash = Some(attribute_name.clone()),
            KeyType::Range => range = Some(attribute_name.clone()),
            _ => {}
        }
    }

    (hash, range)
}
