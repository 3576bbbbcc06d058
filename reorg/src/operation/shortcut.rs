//! Shortcut resolver.
//!
//! A shortcut lets a column name a single value under a keyword instead of a
//! full operation block:
//!
//! ```yaml
//! - column: City
//!   source: town        # same as  operation: { type: get, srcColumn: town }
//! ```
//!
//! Keywords are globally unique; every binding is checked against the
//! operation type's declared parameters when the resolver is built.

use serde_json::{Map, Value};
use std::fmt;

use super::coerce::{coerce, ValueKind};
use super::registry::{KeyedBuilder, OperationEntry, OperationRegistry};
use super::Operation;
use crate::config::{COLUMN_TAG, OPERATION_TAG};
use crate::error::{ConfigurationError, ConfigurationResult, FillResult, PropertyFillError};

/// A keyword bound to one parameter of one operation type.
#[derive(Clone)]
pub struct ShortcutEntry {
    keyword: String,
    operation: &'static str,
    property: &'static str,
    kind: ValueKind,
    build: KeyedBuilder,
}

impl fmt::Debug for ShortcutEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutEntry")
            .field("keyword", &self.keyword)
            .field("operation", &self.operation)
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

impl ShortcutEntry {
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn property(&self) -> &'static str {
        self.property
    }

    /// Build the operation for `column` with `raw` bound to the shortcut's property.
    ///
    /// Equivalent to a full operation block supplying only that property.
    pub fn instantiate(&self, column: &str, raw: Value) -> FillResult<Box<dyn Operation>> {
        let value = coerce(raw, self.kind).map_err(|source| PropertyFillError::Conversion {
            property: self.property.to_string(),
            source,
        })?;
        let mut properties = Map::new();
        properties.insert(self.property.to_string(), value);
        (self.build)(column, &properties)
    }

    /// Pull this shortcut's value out of a column specification and instantiate.
    pub fn instantiate_from_spec(&self, column: &str, spec: &Map<String, Value>) -> FillResult<Box<dyn Operation>> {
        let raw = spec.get(&self.keyword).cloned().unwrap_or(Value::Null);
        self.instantiate(column, raw)
    }
}

/// Keyword -> shortcut catalog, kept in registration order.
#[derive(Debug, Default)]
pub struct ShortcutResolver {
    entries: Vec<ShortcutEntry>,
}

impl ShortcutResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every shortcut declared by the registry's operation types.
    pub fn from_registry(registry: &OperationRegistry) -> ConfigurationResult<Self> {
        let mut resolver = Self::new();
        for entry in registry.entries() {
            if let Some(decl) = entry.shortcut() {
                resolver.register_shortcut(decl.keyword, entry, decl.property)?;
            }
        }
        Ok(resolver)
    }

    /// Bind `keyword` to `property` of `operation`.
    ///
    /// Fails if the property is not declared exactly once by the operation
    /// type, if the keyword is a reserved column tag, or if it is already taken.
    pub fn register_shortcut(
        &mut self,
        keyword: &str,
        operation: &OperationEntry,
        property: &str,
    ) -> ConfigurationResult<()> {
        let mut declared = operation.parameters().iter().filter(|p| p.property == property);
        let param = match (declared.next(), declared.next()) {
            (Some(param), None) => *param,
            _ => {
                return Err(ConfigurationError::UnknownShortcutProperty {
                    keyword: keyword.to_string(),
                    operation: operation.name().to_string(),
                    property: property.to_string(),
                })
            }
        };

        if keyword == COLUMN_TAG || keyword == OPERATION_TAG {
            return Err(ConfigurationError::ReservedKeyword(keyword.to_string()));
        }
        if let Some(existing) = self.resolve(keyword) {
            return Err(ConfigurationError::DuplicateShortcut {
                keyword: keyword.to_string(),
                existing: existing.operation.to_string(),
                property: existing.property.to_string(),
            });
        }

        self.entries.push(ShortcutEntry {
            keyword: keyword.to_string(),
            operation: operation.name(),
            property: param.property,
            kind: param.kind,
            build: operation.builder(),
        });
        Ok(())
    }

    pub fn resolve(&self, keyword: &str) -> Option<&ShortcutEntry> {
        self.entries.iter().find(|e| e.keyword == keyword)
    }

    /// Shortcuts whose keyword is a key of `spec`, in registration order.
    pub fn matching(&self, spec: &Map<String, Value>) -> Vec<&ShortcutEntry> {
        self.entries
            .iter()
            .filter(|e| spec.contains_key(&e.keyword))
            .collect()
    }

    pub fn keywords(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.keyword.clone()).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ShortcutEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;
    use crate::operation::catalog::{Get, Substring};
    use serde_json::json;

    fn builtin() -> (OperationRegistry, ShortcutResolver) {
        let registry = OperationRegistry::builtin().unwrap();
        let shortcuts = ShortcutResolver::from_registry(&registry).unwrap();
        (registry, shortcuts)
    }

    #[test]
    fn test_builtin_shortcuts_registered() {
        let (_, shortcuts) = builtin();
        let source = shortcuts.resolve("source").unwrap();
        assert_eq!(source.operation(), "get");
        assert_eq!(source.property(), "srcColumn");
    }

    #[test]
    fn test_shortcut_matches_structured_form() {
        let (registry, shortcuts) = builtin();
        let row: Row = [("town", "Turin")].into_iter().collect();

        let via_shortcut = shortcuts.resolve("source").unwrap().instantiate("City", json!("town")).unwrap();
        let mut props = Map::new();
        props.insert("srcColumn".into(), json!("town"));
        let via_block = registry.resolve("get").unwrap().instantiate("City", &props).unwrap();

        assert_eq!(format!("{:?}", via_shortcut), format!("{:?}", via_block));
        assert_eq!(via_shortcut.evaluate(&row), via_block.evaluate(&row));
        assert_eq!(via_shortcut.evaluate(&row).unwrap(), "Turin");
    }

    #[test]
    fn test_shortcut_value_is_coerced() {
        let (_, shortcuts) = builtin();
        let row: Row = [("2024", "leap")].into_iter().collect();

        let op = shortcuts.resolve("source").unwrap().instantiate("Y", json!(2024)).unwrap();
        assert_eq!(op.evaluate(&row).unwrap(), "leap");
    }

    #[test]
    fn test_shortcut_conversion_failure() {
        let (_, shortcuts) = builtin();
        let err = shortcuts.resolve("source").unwrap().instantiate("Y", json!({"a": 1})).unwrap_err();
        assert!(matches!(err, PropertyFillError::Conversion { .. }));
    }

    #[test]
    fn test_unknown_property_fails_fast() {
        let mut resolver = ShortcutResolver::new();
        let err = resolver
            .register_shortcut("from", &OperationEntry::of::<Get>(), "column")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UnknownShortcutProperty { ref keyword, ref operation, ref property }
                if keyword == "from" && operation == "get" && property == "column"
        ));
    }

    #[test]
    fn test_duplicate_keyword_fails_fast() {
        let mut resolver = ShortcutResolver::new();
        resolver
            .register_shortcut("source", &OperationEntry::of::<Get>(), "srcColumn")
            .unwrap();
        let err = resolver
            .register_shortcut("source", &OperationEntry::of::<Substring>(), "start")
            .unwrap_err();

        assert!(matches!(err, ConfigurationError::DuplicateShortcut { .. }));
        assert_eq!(resolver.resolve("source").unwrap().property(), "srcColumn");
    }

    #[test]
    fn test_reserved_keyword_rejected() {
        let mut resolver = ShortcutResolver::new();
        let err = resolver
            .register_shortcut("column", &OperationEntry::of::<Get>(), "srcColumn")
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::ReservedKeyword(_)));
    }
}
