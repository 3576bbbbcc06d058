//! Operation registry.
//!
//! Structured column blocks name their operation type (`type: get`). The
//! registry maps those names, case-insensitively, to entries that build and
//! fill the operation. It is built once from an explicit list of types and
//! never changes afterwards.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use super::params::{fill_keyed, parameter_infos, Configurable, ParameterInfo};
use super::Operation;
use crate::error::{ConfigurationError, ConfigurationResult, FillResult};

/// A `(keyword, property)` shortcut declared by an operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutDecl {
    pub keyword: &'static str,
    pub property: &'static str,
}

/// A concrete operation type available to the structured engine.
pub trait OperationKind: Operation + Configurable + 'static {
    /// Registry name, matched case-insensitively.
    const TYPE_NAME: &'static str;
    const DESCRIPTION: &'static str;
    /// Single-value alias, if the type has one salient parameter.
    const SHORTCUT: Option<ShortcutDecl> = None;

    /// A fresh instance for output column `column`, all parameters at their defaults.
    fn named(column: &str) -> Self;
}

pub(crate) type KeyedBuilder = fn(&str, &Map<String, Value>) -> FillResult<Box<dyn Operation>>;

fn build_keyed<O: OperationKind>(column: &str, properties: &Map<String, Value>) -> FillResult<Box<dyn Operation>> {
    let mut operation = O::named(column);
    fill_keyed(&mut operation, properties)?;
    Ok(Box::new(operation))
}

/// Registry entry: everything needed to build one operation type.
#[derive(Clone)]
pub struct OperationEntry {
    name: &'static str,
    description: &'static str,
    parameters: Vec<ParameterInfo>,
    shortcut: Option<ShortcutDecl>,
    build: KeyedBuilder,
}

impl fmt::Debug for OperationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationEntry")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("shortcut", &self.shortcut)
            .finish_non_exhaustive()
    }
}

impl OperationEntry {
    pub fn of<O: OperationKind>() -> Self {
        Self {
            name: O::TYPE_NAME,
            description: O::DESCRIPTION,
            parameters: parameter_infos::<O>(),
            shortcut: O::SHORTCUT,
            build: build_keyed::<O>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    pub fn parameter(&self, property: &str) -> Option<&ParameterInfo> {
        self.parameters.iter().find(|p| p.property == property)
    }

    pub fn shortcut(&self) -> Option<ShortcutDecl> {
        self.shortcut
    }

    pub(crate) fn builder(&self) -> KeyedBuilder {
        self.build
    }

    /// Build an instance for `column` and bind `properties` by key.
    pub fn instantiate(&self, column: &str, properties: &Map<String, Value>) -> FillResult<Box<dyn Operation>> {
        (self.build)(column, properties)
    }
}

/// Case-insensitive name -> operation type catalog.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    entries: Vec<OperationEntry>,
    index: HashMap<String, usize>,
}

impl OperationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the built-in operation types.
    pub fn builtin() -> ConfigurationResult<Self> {
        Self::from_entries(super::catalog::builtin_operations())
    }

    pub fn from_entries(entries: impl IntoIterator<Item = OperationEntry>) -> ConfigurationResult<Self> {
        let mut registry = Self::new();
        for entry in entries {
            registry.register(entry)?;
        }
        Ok(registry)
    }

    /// Add an entry. Blank names and case-insensitive duplicates are rejected.
    pub fn register(&mut self, entry: OperationEntry) -> ConfigurationResult<()> {
        let key = entry.name().trim().to_lowercase();
        if key.is_empty() {
            return Err(ConfigurationError::BlankName);
        }
        if self.index.contains_key(&key) {
            return Err(ConfigurationError::DuplicateName {
                kind: "operation",
                name: entry.name().to_string(),
            });
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Look up a type by name, ignoring case and surrounding whitespace.
    pub fn resolve(&self, name: &str) -> Option<&OperationEntry> {
        self.index
            .get(&name.trim().to_lowercase())
            .and_then(|&i| self.entries.get(i))
    }

    /// Entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &OperationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
