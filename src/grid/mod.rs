//! Flattening of schema-less, multi-valued items into a stable table.
//!
//! [`ColumnRegistry`] gives every `(attribute name, occurrence within item)`
//! pair a fixed [`ColumnKey`] and tracks a display width per column.
//! [`Aggregator`] pulls pages from a [`PagedItemSource`] until the store runs
//! out of pages or the page ceiling is hit, building one sparse [`Row`] per
//! item.
pub mod aggregate;
pub mod column;
pub mod error;
pub mod json;
pub mod row;
pub mod source;
pub mod text;

pub use aggregate::*;
pub use column::*;
pub use error::*;
pub use row::*;
pub use source::*;
