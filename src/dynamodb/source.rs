use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;

use super::{TableKeys, format_sdk_error, send_dynamo_request, to_grid_item};
use crate::grid::{Page, PagedItemSource, StoreError};

/// DynamoDB's `LastEvaluatedKey`, handed back as `ExclusiveStartKey`.
pub type ScanCursor = HashMap<String, AttributeValue>;

/// Pages through a whole table with `Scan`.
pub struct ScanSource {
    client: Client,
    table_name: String,
    keys: TableKeys,
    page_size: i32,
    consistent_read: bool,
}

impl ScanSource {
    pub fn new(client: Client, table_name: impl Into<String>, keys: TableKeys) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            keys,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            consistent_read: true,
        }
    }

    pub fn page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl PagedItemSource for ScanSource {
    type Cursor = ScanCursor;

    async fn fetch_page(
        &mut self,
        cursor: Option<ScanCursor>,
    ) -> Result<Page<ScanCursor>, StoreError> {
        let start_key_present = cursor.is_some();
        tracing::trace!(
            table = %self.table_name,
            start_key = ?cursor,
            limit = self.page_size,
            consistent_read = self.consistent_read,
            "Scan"
        );

        let request = self
            .client
            .scan()
            .table_name(&self.table_name)
            .limit(self.page_size)
            .consistent_read(self.consistent_read)
            .set_exclusive_start_key(cursor);

        let span = tracing::trace_span!(
            "Scan",
            table = %self.table_name,
            start_key_present,
            limit = self.page_size
        );
        let output = send_dynamo_request(span, || request.send(), format_sdk_error)
            .await
            .map_err(|err| StoreError::new(format_sdk_error(&err)))?;

        let items = output
            .items()
            .iter()
            .map(|item| to_grid_item(item, &self.keys))
            .collect();
        let next_cursor = output.last_evaluated_key.filter(|key| !key.is_empty());

        Ok(Page { items, next_cursor })
    }
}
