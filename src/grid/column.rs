use std::collections::HashMap;
use std::fmt;

/// Label shown for the item identifier pseudo-column.
pub const IDENTIFIER_LABEL: &str = "ID";

/// Wire form of the identifier pseudo-column. Attribute keys always carry a
/// `#<occurrence>` suffix, so this can never clash with one of them.
pub const IDENTIFIER_WIRE_KEY: &str = "_ItemName_";

/// Stable identity of a display column.
///
/// A key is a pure function of the attribute name and of how many times that
/// name already appeared in the same item, so the same `(name, occurrence)`
/// pair resolves to the same column no matter which item or page it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKey {
    Identifier,
    Attribute { name: String, occurrence: usize },
}

impl ColumnKey {
    pub fn attribute(name: impl Into<String>, occurrence: usize) -> Self {
        ColumnKey::Attribute {
            name: name.into(),
            occurrence,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, ColumnKey::Identifier)
    }

    /// String form used as an object key in JSON output.
    pub fn wire_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::Identifier => f.write_str(IDENTIFIER_WIRE_KEY),
            ColumnKey::Attribute { name, occurrence } => write!(f, "{name}#{occurrence}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub display_name: String,
    /// Widest value seen under this column (display name included), in chars.
    pub max_width: usize,
}

impl ColumnInfo {
    fn observe(&mut self, value: &str) {
        self.max_width = self.max_width.max(char_len(value));
    }
}

/// Columns discovered during one aggregation run, kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: Vec<(ColumnKey, ColumnInfo)>,
    index: HashMap<ColumnKey, usize>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the identifier pseudo-column. Calling it again is a no-op.
    pub fn register_identifier_column(&mut self) -> ColumnKey {
        let key = ColumnKey::Identifier;
        if !self.index.contains_key(&key) {
            self.insert(
                key.clone(),
                ColumnInfo {
                    display_name: IDENTIFIER_LABEL.to_string(),
                    max_width: 0,
                },
            );
        }
        key
    }

    /// Resolve an attribute occurrence to its column, registering it on first
    /// sight. The first registration fixes the display name.
    pub fn resolve(&mut self, name: &str, occurrence: usize) -> ColumnKey {
        let key = ColumnKey::attribute(name, occurrence);
        match self.index.get(&key) {
            Some(&pos) => self.columns[pos].1.observe(name),
            None => self.insert(
                key.clone(),
                ColumnInfo {
                    display_name: name.to_string(),
                    max_width: char_len(name),
                },
            ),
        }
        key
    }

    pub fn observe_width(&mut self, key: &ColumnKey, value: &str) {
        debug_assert!(
            self.index.contains_key(key),
            "width observed for unregistered column {key}"
        );
        let Some(&pos) = self.index.get(key) else {
            tracing::warn!(column = %key, "Width observed for unregistered column");
            return;
        };
        self.columns[pos].1.observe(value);
    }

    pub fn get(&self, key: &ColumnKey) -> Option<&ColumnInfo> {
        self.index.get(key).map(|&pos| &self.columns[pos].1)
    }

    pub fn contains(&self, key: &ColumnKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnKey, &ColumnInfo)> {
        self.columns.iter().map(|(key, info)| (key, info))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColumnKey> {
        self.columns.iter().map(|(key, _)| key)
    }

    fn insert(&mut self, key: ColumnKey, info: ColumnInfo) {
        self.index.insert(key.clone(), self.columns.len());
        self.columns.push((key, info));
    }
}

pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_column_is_seeded_once() {
        let mut registry = ColumnRegistry::new();
        let first = registry.register_identifier_column();
        let second = registry.register_identifier_column();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        let info = registry.get(&ColumnKey::Identifier).unwrap();
        assert_eq!(info.display_name, "ID");
        assert_eq!(info.max_width, 0);
    }

    #[test]
    fn resolve_is_stable_per_name_and_occurrence() {
        let mut registry = ColumnRegistry::new();
        let a = registry.resolve("color", 0);
        let b = registry.resolve("color", 0);
        let c = registry.resolve("color", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&c).unwrap().display_name, "color");
    }

    #[test]
    fn new_column_starts_at_name_width() {
        let mut registry = ColumnRegistry::new();
        let key = registry.resolve("größe", 0);
        assert_eq!(registry.get(&key).unwrap().max_width, 5);
    }

    #[test]
    fn widths_never_shrink() {
        let mut registry = ColumnRegistry::new();
        let key = registry.resolve("x", 0);
        registry.observe_width(&key, "abcdef");
        registry.observe_width(&key, "ab");
        assert_eq!(registry.get(&key).unwrap().max_width, 6);
    }

    #[test]
    fn iteration_follows_registration_order() {
        let mut registry = ColumnRegistry::new();
        registry.register_identifier_column();
        registry.resolve("zeta", 0);
        registry.resolve("alpha", 0);
        registry.resolve("zeta", 1);
        let names: Vec<String> = registry.keys().map(|key| key.wire_key()).collect();
        assert_eq!(names, vec!["_ItemName_", "zeta#0", "alpha#0", "zeta#1"]);
    }

    #[test]
    fn wire_keys_do_not_collide_with_identifier() {
        let attr = ColumnKey::attribute(IDENTIFIER_WIRE_KEY, 0);
        assert_ne!(attr.wire_key(), ColumnKey::Identifier.wire_key());
        let hashy = ColumnKey::attribute("a#1", 0);
        let plain = ColumnKey::attribute("a", 1);
        assert_ne!(hashy.wire_key(), plain.wire_key());
    }
}
