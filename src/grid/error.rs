use std::fmt;

/// A failed call against the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug)]
pub enum AggregateError {
    /// A page fetch failed; rows collected so far are discarded.
    StoreQuery { page: usize, source: StoreError },
    /// Cancellation was requested at a page boundary.
    Cancelled { pages_fetched: usize },
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateError::StoreQuery { page, source } => {
                write!(f, "error while retrieving the items list (page {page}): {source}")
            }
            AggregateError::Cancelled { pages_fetched } => {
                write!(f, "item retrieval cancelled after {pages_fetched} page(s)")
            }
        }
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AggregateError::StoreQuery { source, .. } => Some(source),
            AggregateError::Cancelled { .. } => None,
        }
    }
}
