use std::time::Duration;

use async_trait::async_trait;

use super::{Item, StoreError};

/// One page of items plus the cursor to resume from, if any.
#[derive(Debug, Clone)]
pub struct Page<C> {
    pub items: Vec<Item>,
    pub next_cursor: Option<C>,
}

impl<C> Page<C> {
    pub fn last(items: Vec<Item>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    pub fn with_cursor(items: Vec<Item>, cursor: C) -> Self {
        Self {
            items,
            next_cursor: Some(cursor),
        }
    }
}

/// A store that hands out items one page at a time.
///
/// The cursor is opaque to callers: whatever a page returns as `next_cursor`
/// is passed back verbatim to fetch the following page.
#[async_trait]
pub trait PagedItemSource: Send {
    type Cursor: Send;

    async fn fetch_page(
        &mut self,
        cursor: Option<Self::Cursor>,
    ) -> Result<Page<Self::Cursor>, StoreError>;
}

/// Bounds every `fetch_page` call of the wrapped source.
pub struct TimeoutSource<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutSource<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S> PagedItemSource for TimeoutSource<S>
where
    S: PagedItemSource,
{
    type Cursor = S::Cursor;

    async fn fetch_page(
        &mut self,
        cursor: Option<Self::Cursor>,
    ) -> Result<Page<Self::Cursor>, StoreError> {
        match tokio::time::timeout(self.timeout, self.inner.fetch_page(cursor)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis(), "Page fetch timed out");
                Err(StoreError::new(format!(
                    "page fetch timed out after {} ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl PagedItemSource for Stalled {
        type Cursor = ();

        async fn fetch_page(&mut self, _cursor: Option<()>) -> Result<Page<()>, StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Page::last(Vec::new()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_store_error() {
        let mut source = TimeoutSource::new(Stalled, Duration::from_millis(50));
        let err = source.fetch_page(None).await.unwrap_err();
        assert!(err.message().contains("timed out after 50 ms"));
    }
}
