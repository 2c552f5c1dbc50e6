use std::collections::HashMap;

use super::ColumnKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One schema-less record as returned by the store. Attribute names may repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub identifier: String,
    pub attributes: Vec<Attribute>,
}

impl Item {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }
}

/// Sparse mapping from column to value for a single item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: HashMap<ColumnKey, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` unless the cell is already filled. Returns whether the
    /// value was kept.
    pub fn insert_first(&mut self, key: ColumnKey, value: String) -> bool {
        if self.cells.contains_key(&key) {
            return false;
        }
        self.cells.insert(key, value);
        true
    }

    pub fn get(&self, key: &ColumnKey) -> Option<&str> {
        self.cells.get(key).map(String::as_str)
    }

    pub fn identifier(&self) -> Option<&str> {
        self.get(&ColumnKey::Identifier)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnKey, &str)> {
        self.cells.iter().map(|(key, value)| (key, value.as_str()))
    }
}
