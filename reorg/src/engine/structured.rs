//! Structured engine.
//!
//! Each column either carries an explicit operation block or a single
//! shortcut key:
//!
//! ```yaml
//! - column: Full
//!   operation: { type: concat, values: [First, " ", Last] }
//! - column: City
//!   source: town
//! ```

use serde_json::Value;

use super::{column_name, Engine, EngineKind};
use crate::config::{ColumnSpec, COLUMN_TAG, OPERATION_TAG, TYPE_TAG};
use crate::error::{ConfigurationResult, ImportError, ImportResult};
use crate::logs::{log_debug, log_warning};
use crate::operation::{Operation, OperationRegistry, ShortcutResolver};

/// Engine for explicit operation blocks and shortcuts.
#[derive(Debug)]
pub struct StructuredEngine {
    registry: OperationRegistry,
    shortcuts: ShortcutResolver,
}

impl StructuredEngine {
    /// Engine over the built-in operation catalog.
    pub fn new() -> ConfigurationResult<Self> {
        Self::with_registry(OperationRegistry::builtin()?)
    }

    /// Engine over a custom registry; shortcuts are derived from it.
    pub fn with_registry(registry: OperationRegistry) -> ConfigurationResult<Self> {
        let shortcuts = ShortcutResolver::from_registry(&registry)?;
        Ok(Self { registry, shortcuts })
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn shortcuts(&self) -> &ShortcutResolver {
        &self.shortcuts
    }

    /// Top-level keys that are neither the column name, the operation block
    /// nor a shortcut keyword.
    fn unused_keys<'a>(&self, spec: &'a ColumnSpec) -> Vec<&'a str> {
        spec.keys()
            .map(String::as_str)
            .filter(|k| *k != COLUMN_TAG && *k != OPERATION_TAG && self.shortcuts.resolve(k).is_none())
            .collect()
    }

    fn parse_block(&self, column: &str, block: &Value) -> ImportResult<Box<dyn Operation>> {
        let properties = block.as_object().ok_or_else(|| ImportError::MalformedOperation {
            column: column.to_string(),
            message: format!("expected a mapping, found {}", block),
        })?;

        let type_name = match properties.get(TYPE_TAG) {
            None | Some(Value::Null) => {
                return Err(ImportError::MissingTag {
                    column: column.to_string(),
                    tag: TYPE_TAG,
                })
            }
            Some(Value::String(s)) if !s.trim().is_empty() => s.as_str(),
            Some(other) => {
                return Err(ImportError::MalformedOperation {
                    column: column.to_string(),
                    message: format!("operation type must be a non-empty string, found {}", other),
                })
            }
        };

        let entry = self
            .registry
            .resolve(type_name)
            .ok_or_else(|| ImportError::UnknownOperation {
                column: column.to_string(),
                operation: type_name.to_string(),
            })?;

        for key in properties.keys() {
            if key != TYPE_TAG && entry.parameter(key).is_none() {
                log_warning(format!(
                    "Column '{}': property '{}' is not a parameter of '{}', ignored",
                    column,
                    key,
                    entry.name()
                ));
            }
        }

        log_debug(format!("Column '{}': operation '{}'", column, entry.name()));
        entry
            .instantiate(column, properties)
            .map_err(|source| ImportError::Fill {
                column: column.to_string(),
                source,
            })
    }

    fn parse_shortcut(&self, column: &str, spec: &ColumnSpec) -> ImportResult<Box<dyn Operation>> {
        let matches = self.shortcuts.matching(spec);
        let Some(shortcut) = matches.first() else {
            return Err(ImportError::NoMatchingShortcut {
                column: column.to_string(),
                keywords: self.shortcuts.keywords(),
            });
        };

        if matches.len() > 1 {
            let keywords: Vec<&str> = matches.iter().map(|m| m.keyword()).collect();
            log_warning(format!(
                "Column '{}': several shortcut keys ({}), using '{}'",
                column,
                keywords.join(", "),
                shortcut.keyword()
            ));
        }

        log_debug(format!(
            "Column '{}': shortcut '{}' -> {}.{}",
            column,
            shortcut.keyword(),
            shortcut.operation(),
            shortcut.property()
        ));
        shortcut
            .instantiate_from_spec(column, spec)
            .map_err(|source| ImportError::Shortcut {
                column: column.to_string(),
                keyword: shortcut.keyword().to_string(),
                source,
            })
    }
}

impl Engine for StructuredEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Structured
    }

    fn parse_column(&self, spec: &ColumnSpec) -> ImportResult<Box<dyn Operation>> {
        let column = column_name(spec)?;

        for key in self.unused_keys(spec) {
            log_warning(format!("Column '{}': key '{}' ignored by the structured engine", column, key));
        }

        match spec.get(OPERATION_TAG) {
            Some(block) => {
                let stray: Vec<&str> = self
                    .shortcuts
                    .matching(spec)
                    .iter()
                    .map(|s| s.keyword())
                    .collect();
                if !stray.is_empty() {
                    return Err(ImportError::MixedStyles {
                        column,
                        message: format!(
                            "operation block combined with shortcut key(s) {}",
                            stray.join(", ")
                        ),
                    });
                }
                self.parse_block(&column, block)
            }
            None => self.parse_shortcut(&column, spec),
        }
    }

    fn describe(&self) -> String {
        let mut out = String::from("| Type | Parameters | Shortcut | Description |\n|------|------------|----------|-------------|\n");
        for entry in self.registry.entries() {
            let params: Vec<String> = entry
                .parameters()
                .iter()
                .map(|p| {
                    if p.required {
                        format!("{}: {}", p.property, p.kind)
                    } else {
                        format!("{}?: {}", p.property, p.kind)
                    }
                })
                .collect();
            let shortcut = entry
                .shortcut()
                .map(|s| format!("{} -> {}", s.keyword, s.property))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                entry.name(),
                params.join(", "),
                shortcut,
                entry.description()
            ));
        }
        out.push_str(&format!(
            "\nEvery column needs '{}' and either '{}: {{{}: ...}}' or one shortcut key.",
            COLUMN_TAG, OPERATION_TAG, TYPE_TAG
        ));
        out
    }
}
