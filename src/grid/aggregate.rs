use std::collections::HashMap;

use tokio::sync::watch;

use super::{AggregateError, ColumnKey, ColumnRegistry, Item, PagedItemSource, Row};

/// Columns and rows collected from one paginated run.
#[derive(Debug, Clone)]
pub struct AggregationResult {
    pub registry: ColumnRegistry,
    pub rows: Vec<Row>,
    pub pages_fetched: usize,
    /// The page ceiling stopped the run while the store still had more pages.
    pub truncated: bool,
}

/// Drives the page loop of a [`PagedItemSource`] and flattens every item into
/// a row.
#[derive(Debug, Clone)]
pub struct Aggregator {
    max_pages: usize,
    cancel: Option<watch::Receiver<bool>>,
}

impl Aggregator {
    /// At least one page is always fetched, so `0` behaves like `1`.
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages: max_pages.max(1),
            cancel: None,
        }
    }

    /// Abort with [`AggregateError::Cancelled`] once the flag turns `true`.
    /// The flag is checked before each page fetch.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn run<S>(&self, source: &mut S) -> Result<AggregationResult, AggregateError>
    where
        S: PagedItemSource + ?Sized,
    {
        let mut registry = ColumnRegistry::new();
        let identifier = registry.register_identifier_column();
        let mut rows = Vec::new();
        let mut cursor: Option<S::Cursor> = None;
        let mut pages = 0;

        loop {
            if self.is_cancelled() {
                tracing::debug!(pages, "Aggregation cancelled");
                return Err(AggregateError::Cancelled {
                    pages_fetched: pages,
                });
            }

            let page = source
                .fetch_page(cursor.take())
                .await
                .map_err(|source| AggregateError::StoreQuery {
                    page: pages + 1,
                    source,
                })?;

            let item_count = page.items.len();
            for item in &page.items {
                rows.push(flatten_item(&mut registry, &identifier, item));
            }

            pages += 1;
            cursor = page.next_cursor;
            tracing::debug!(
                page = pages,
                items = item_count,
                columns = registry.len(),
                has_more = cursor.is_some(),
                "Aggregated page"
            );

            if cursor.is_none() || pages >= self.max_pages {
                break;
            }
        }

        let truncated = cursor.is_some();
        if truncated {
            tracing::warn!(
                max_pages = self.max_pages,
                rows = rows.len(),
                "Page limit reached, returning a partial result"
            );
        }

        Ok(AggregationResult {
            registry,
            rows,
            pages_fetched: pages,
            truncated,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// Run a full aggregation against `source`, fetching at most `max_pages` pages.
pub async fn aggregate<S>(
    source: &mut S,
    max_pages: usize,
) -> Result<AggregationResult, AggregateError>
where
    S: PagedItemSource + ?Sized,
{
    Aggregator::new(max_pages).run(source).await
}

fn flatten_item(registry: &mut ColumnRegistry, identifier: &ColumnKey, item: &Item) -> Row {
    let mut row = Row::new();
    row.insert_first(identifier.clone(), item.identifier.clone());
    registry.observe_width(identifier, &item.identifier);

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for attribute in &item.attributes {
        let occurrence = seen.entry(attribute.name.as_str()).or_insert(0);
        let key = registry.resolve(&attribute.name, *occurrence);
        *occurrence += 1;

        if row.insert_first(key.clone(), attribute.value.clone()) {
            registry.observe_width(&key, &attribute.value);
        } else {
            tracing::trace!(
                item = %item.identifier,
                column = %key,
                "Dropping duplicate value for filled column"
            );
        }
    }
    row
}
