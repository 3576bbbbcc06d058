//! Engines: front-end syntaxes turning column specifications into operations.
//!
//! - [`StructuredEngine`] reads explicit operation blocks and shortcuts
//! - [`TemplateEngine`] reads `{{ field | filter:arg }}` templates
//!
//! Both produce [`Operation`] trees; the rest of the pipeline never knows
//! which engine built them.

pub mod structured;
pub mod template;

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::config::{ColumnSpec, COLUMN_TAG};
use crate::error::{ConfigurationError, ConfigurationResult, ImportError, ImportResult};
use crate::operation::Operation;

pub use structured::StructuredEngine;
pub use template::TemplateEngine;

/// Placeholder used in errors when a column has no usable name.
pub const UNNAMED_COLUMN: &str = "<unnamed>";

/// A front-end syntax.
pub trait Engine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Turn one column specification into its operation tree.
    fn parse_column(&self, spec: &ColumnSpec) -> ImportResult<Box<dyn Operation>>;

    /// Human-readable catalog of what this engine accepts.
    fn describe(&self) -> String;
}

/// Engine selector from the configuration header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Structured = 1,
    Template = 2,
}

impl EngineKind {
    pub const ALL: [EngineKind; 2] = [EngineKind::Structured, EngineKind::Template];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Structured => "structured",
            EngineKind::Template => "template",
        }
    }

    /// Read a header selector: a number, or a string holding the id or the
    /// name (trimmed, case-insensitive).
    pub fn from_value(value: &Value) -> ConfigurationResult<Self> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .and_then(Self::from_id)
                .ok_or_else(|| ConfigurationError::UnknownEngine(n.to_string())),
            Value::String(s) => s.parse(),
            Value::Null => Err(ConfigurationError::MissingEngine),
            other => Err(ConfigurationError::UnknownEngine(other.to_string())),
        }
    }

    fn from_id(id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|k| u64::from(k.id()) == id)
    }
}

impl FromStr for EngineKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        if key.is_empty() {
            return Err(ConfigurationError::MissingEngine);
        }
        if let Ok(id) = key.parse::<u64>() {
            return Self::from_id(id).ok_or_else(|| ConfigurationError::UnknownEngine(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| ConfigurationError::UnknownEngine(s.to_string()))
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.id())
    }
}

/// Build the engine for `kind`, with its catalogs.
pub fn build_engine(kind: EngineKind) -> ConfigurationResult<Box<dyn Engine>> {
    let engine: Box<dyn Engine> = match kind {
        EngineKind::Structured => Box::new(StructuredEngine::new()?),
        EngineKind::Template => Box::new(TemplateEngine::new()?),
    };
    Ok(engine)
}

/// Read the output column name of a specification.
///
/// Integers are accepted and stringified; anything else that is not a
/// non-blank string is rejected.
pub fn column_name(spec: &ColumnSpec) -> ImportResult<String> {
    match spec.get(COLUMN_TAG) {
        None | Some(Value::Null) => Err(ImportError::MissingTag {
            column: UNNAMED_COLUMN.to_string(),
            tag: COLUMN_TAG,
        }),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Some(other) => Err(ImportError::InvalidColumnName {
            column: match other {
                Value::String(s) => s.clone(),
                v => v.to_string(),
            },
        }),
    }
}

/// Catalog listing of every engine, for the `operations` command.
pub fn catalog_description() -> ConfigurationResult<String> {
    let mut sections = Vec::new();
    for kind in EngineKind::ALL {
        let engine = build_engine(kind)?;
        sections.push(format!("Engine {}\n\n{}", kind, engine.describe()));
    }
    Ok(sections.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> ColumnSpec {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_engine_selector_by_id_and_name() {
        for selector in [json!(1), json!("1"), json!(" Structured "), json!("STRUCTURED")] {
            assert_eq!(EngineKind::from_value(&selector).unwrap(), EngineKind::Structured);
        }
        for selector in [json!(2), json!(" 2"), json!("template")] {
            assert_eq!(EngineKind::from_value(&selector).unwrap(), EngineKind::Template);
        }
    }

    #[test]
    fn test_engine_selector_rejects_unknown() {
        assert!(matches!(
            EngineKind::from_value(&json!(3)),
            Err(ConfigurationError::UnknownEngine(ref e)) if e == "3"
        ));
        assert!(matches!(
            EngineKind::from_value(&json!("jinja")),
            Err(ConfigurationError::UnknownEngine(_))
        ));
        assert!(matches!(
            EngineKind::from_value(&json!("  ")),
            Err(ConfigurationError::MissingEngine)
        ));
        assert!(matches!(
            EngineKind::from_value(&json!(true)),
            Err(ConfigurationError::UnknownEngine(_))
        ));
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(&spec(json!({"column": "City"}))).unwrap(), "City");
        assert_eq!(column_name(&spec(json!({"column": 2024}))).unwrap(), "2024");
    }

    #[test]
    fn test_column_name_missing() {
        let err = column_name(&spec(json!({"source": "town"}))).unwrap_err();
        assert!(matches!(err, ImportError::MissingTag { tag: "column", .. }));
    }

    #[test]
    fn test_column_name_invalid() {
        for value in [json!(""), json!("   "), json!(["a"]), json!(true)] {
            let err = column_name(&spec(json!({"column": value}))).unwrap_err();
            assert!(matches!(err, ImportError::InvalidColumnName { .. }));
        }
    }

    #[test]
    fn test_catalog_lists_both_engines() {
        let text = catalog_description().unwrap();
        assert!(text.contains("structured"));
        assert!(text.contains("template"));
        assert!(text.contains("source"));
        assert!(text.contains("truncate"));
    }
}
