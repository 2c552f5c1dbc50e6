use std::{collections::HashMap, fmt, time::Duration};

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, TableStatus};

use super::{
    CreateTableSpec, TableKeys, create_table, describe_table, format_sdk_error,
    send_dynamo_request,
};
use crate::grid::StoreError;

const RECREATE_POLL_INTERVAL: Duration = Duration::from_millis(500);
const RECREATE_MAX_POLLS: u32 = 240;

#[derive(Debug)]
pub enum MutationError {
    InvalidInput(String),
    Store(StoreError),
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationError::InvalidInput(message) => write!(f, "invalid input: {message}"),
            MutationError::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl std::error::Error for MutationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MutationError::InvalidInput(_) => None,
            MutationError::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for MutationError {
    fn from(err: StoreError) -> Self {
        MutationError::Store(err)
    }
}

/// `SET` expression with `#nameN` / `:valN` placeholders.
#[derive(Debug, Default, PartialEq)]
pub struct UpdateExpression {
    expression: String,
    attribute_names: HashMap<String, String>,
    attribute_values: HashMap<String, AttributeValue>,
}

impl UpdateExpression {
    /// Build a replacing `SET` for the given `(name, value)` pairs. A name that
    /// appears more than once becomes a string set holding all its values.
    pub fn set_attributes(
        assignments: &[(String, String)],
        keys: &TableKeys,
    ) -> Result<Self, MutationError> {
        if assignments.is_empty() {
            return Err(MutationError::InvalidInput(
                "at least one attribute is required".to_string(),
            ));
        }

        let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
        for (name, value) in assignments {
            if name.is_empty() {
                return Err(MutationError::InvalidInput(
                    "attribute name is empty".to_string(),
                ));
            }
            if keys.is_key(name) {
                return Err(MutationError::InvalidInput(format!(
                    "{name} is part of the primary key and cannot be updated"
                )));
            }
            match grouped.iter_mut().find(|(existing, _)| *existing == name.as_str()) {
                Some((_, values)) => values.push(value.as_str()),
                None => grouped.push((name.as_str(), vec![value.as_str()])),
            }
        }

        let mut update = UpdateExpression::default();
        let mut clauses = Vec::with_capacity(grouped.len());
        for (counter, (name, values)) in grouped.into_iter().enumerate() {
            let name_placeholder = format!("#name{counter}");
            let value_placeholder = format!(":val{counter}");
            let value = match values.as_slice() {
                [single] => AttributeValue::S(single.to_string()),
                many => {
                    let mut set: Vec<String> = Vec::with_capacity(many.len());
                    for value in many {
                        if !set.iter().any(|existing| existing == value) {
                            set.push(value.to_string());
                        }
                    }
                    AttributeValue::Ss(set)
                }
            };
            clauses.push(format!("{name_placeholder} = {value_placeholder}"));
            update
                .attribute_names
                .insert(name_placeholder, name.to_string());
            update.attribute_values.insert(value_placeholder, value);
        }
        update.expression = format!("SET {}", clauses.join(", "));
        Ok(update)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn attribute_names(&self) -> &HashMap<String, String> {
        &self.attribute_names
    }

    pub fn attribute_values(&self) -> &HashMap<String, AttributeValue> {
        &self.attribute_values
    }
}

/// Parse a `NAME=VALUE` assignment. Only the first `=` separates.
pub fn parse_assignment(raw: &str) -> Result<(String, String), MutationError> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(MutationError::InvalidInput(format!(
            "expected NAME=VALUE, got {raw:?}"
        )));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(MutationError::InvalidInput(format!(
            "attribute name is empty in {raw:?}"
        )));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Replace the given attributes on one item, creating the item if needed.
pub async fn update_item(
    client: &Client,
    table_name: &str,
    key: HashMap<String, AttributeValue>,
    update: UpdateExpression,
) -> Result<(), MutationError> {
    tracing::trace!(
        table = %table_name,
        key = ?key,
        expression = %update.expression,
        attribute_names = ?update.attribute_names,
        "UpdateItem"
    );
    let request = client
        .update_item()
        .table_name(table_name)
        .set_key(Some(key))
        .update_expression(update.expression)
        .set_expression_attribute_names(Some(update.attribute_names))
        .set_expression_attribute_values(Some(update.attribute_values));

    let span = tracing::trace_span!("UpdateItem", table = %table_name);
    send_dynamo_request(span, || request.send(), format_sdk_error)
        .await
        .map(|_| ())
        .map_err(|err| StoreError::new(format_sdk_error(&err)).into())
}

pub async fn remove_item(
    client: &Client,
    table_name: &str,
    key: HashMap<String, AttributeValue>,
) -> Result<(), MutationError> {
    tracing::trace!(table = %table_name, key = ?key, "DeleteItem");
    let request = client
        .delete_item()
        .table_name(table_name)
        .set_key(Some(key));

    let span = tracing::trace_span!("DeleteItem", table = %table_name);
    send_dynamo_request(span, || request.send(), format_sdk_error)
        .await
        .map(|_| ())
        .map_err(|err| StoreError::new(format_sdk_error(&err)).into())
}

/// Drop every item of a table by deleting it and creating it again with the
/// same keys and secondary indexes.
pub async fn clear_table(client: &Client, table_name: &str) -> Result<(), MutationError> {
    let table_desc = describe_table(client, table_name).await?;
    let spec = CreateTableSpec::from_description(&table_desc).map_err(MutationError::InvalidInput)?;
    spec.validate().map_err(MutationError::InvalidInput)?;

    let span = tracing::trace_span!("DeleteTable", table = %table_name);
    send_dynamo_request(
        span,
        || client.delete_table().table_name(table_name).send(),
        format_sdk_error,
    )
    .await
    .map_err(|err| StoreError::new(format_sdk_error(&err)))?;
    tracing::info!(table = %table_name, "Deleted table, waiting for it to disappear");

    wait_for_status(client, table_name, None).await?;

    create_table(client, &spec)
        .await
        .map_err(StoreError::new)?;
    wait_for_status(client, table_name, Some(TableStatus::Active)).await?;
    tracing::info!(table = %table_name, "Recreated empty table");
    Ok(())
}

/// Poll until the table reaches `wanted`; `None` waits for it to be gone.
async fn wait_for_status(
    client: &Client,
    table_name: &str,
    wanted: Option<TableStatus>,
) -> Result<(), StoreError> {
    for attempt in 1..=RECREATE_MAX_POLLS {
        let current = table_status(client, table_name).await?;
        if current == wanted {
            return Ok(());
        }
        tracing::debug!(
            table = %table_name,
            attempt,
            status = ?current,
            wanted = ?wanted,
            "Waiting for table status"
        );
        tokio::time::sleep(RECREATE_POLL_INTERVAL).await;
    }
    Err(StoreError::new(format!(
        "table {table_name} did not reach {wanted:?} in time"
    )))
}

async fn table_status(
    client: &Client,
    table_name: &str,
) -> Result<Option<TableStatus>, StoreError> {
    let span = tracing::trace_span!("DescribeTable", table = %table_name);
    match send_dynamo_request(
        span,
        || client.describe_table().table_name(table_name).send(),
        format_sdk_error,
    )
    .await
    {
        Ok(output) => Ok(output
            .table()
            .and_then(|table| table.table_status())
            .cloned()),
        Err(err)
            if err
                .as_service_error()
                .is_some_and(|service_err| service_err.is_resource_not_found_exception()) =>
        {
            Ok(None)
        }
        Err(err) => Err(StoreError::new(format_sdk_error(&err))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::{AttributeType, KeyAttribute};

    fn keys() -> TableKeys {
        TableKeys {
            hash: KeyAttribute {
                name: "PK".to_string(),
                attr_type: AttributeType::String,
            },
            range: None,
        }
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn builds_placeholder_set_expression() {
        let assignments = pairs(&[("status", "open"), ("owner", "ann")]);
        let update = UpdateExpression::set_attributes(&assignments, &keys()).unwrap();
        assert_eq!(update.expression(), "SET #name0 = :val0, #name1 = :val1");
        assert_eq!(update.attribute_names()["#name0"], "status");
        assert_eq!(
            update.attribute_values()[":val1"],
            AttributeValue::S("ann".to_string())
        );
    }

    #[test]
    fn repeated_names_become_string_sets() {
        let update = UpdateExpression::set_attributes(
            &pairs(&[("tag", "red"), ("tag", "blue"), ("tag", "red")]),
            &keys(),
        )
        .unwrap();
        assert_eq!(update.expression(), "SET #name0 = :val0");
        assert_eq!(
            update.attribute_values()[":val0"],
            AttributeValue::Ss(vec!["red".to_string(), "blue".to_string()])
        );
    }

    #[test]
    fn key_attributes_cannot_be_set() {
        let err = UpdateExpression::set_attributes(&pairs(&[("PK", "x")]), &keys()).unwrap_err();
        assert!(err.to_string().contains("primary key"));
    }

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("query=a=b").unwrap(),
            ("query".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
