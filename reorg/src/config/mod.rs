//! Configuration documents.
//!
//! A configuration is a YAML document with a `header` selecting the engine
//! and a `columns` list holding one specification per output column, in
//! output order. Column specifications stay dynamic: their keys depend on
//! the engine and on which operation types and shortcuts are registered.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::engine::EngineKind;
use crate::error::{ConfigurationError, ConfigurationResult};

/// Key holding the output column name.
pub const COLUMN_TAG: &str = "column";
/// Key holding a structured operation block.
pub const OPERATION_TAG: &str = "operation";
/// Key naming the operation type inside an operation block.
pub const TYPE_TAG: &str = "type";
/// Key holding a template string.
pub const TEMPLATE_TAG: &str = "template";

/// One user-authored column specification.
pub type ColumnSpec = Map<String, Value>;

/// A complete configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub header: Header,

    /// Column specifications in output order.
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

/// Document header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    /// Engine selector: numeric id or name.
    #[serde(default)]
    pub engine: Option<Value>,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Input delimiter (auto-detected when absent)
    #[serde(default)]
    pub delimiter: Option<char>,

    /// Output delimiter (default: ',')
    #[serde(default)]
    pub output_delimiter: Option<char>,
}

impl Configuration {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> ConfigurationResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigurationResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// The engine selected by the header.
    pub fn engine_kind(&self) -> ConfigurationResult<EngineKind> {
        match &self.header.engine {
            Some(selector) => EngineKind::from_value(selector),
            None => Err(ConfigurationError::MissingEngine),
        }
    }

    fn validate(&self) -> ConfigurationResult<()> {
        self.engine_kind()?;
        if self.columns.is_empty() {
            return Err(ConfigurationError::NoColumns);
        }
        for delimiter in [self.header.delimiter, self.header.output_delimiter].into_iter().flatten() {
            check_delimiter(delimiter)?;
        }
        Ok(())
    }
}

/// Delimiters are written as single ASCII bytes and cannot collide with
/// the quote character or record terminators.
pub fn check_delimiter(delimiter: char) -> ConfigurationResult<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(|b| b.is_ascii() && !matches!(*b, b'"' | b'\n' | b'\r'))
        .ok_or(ConfigurationError::InvalidDelimiter(delimiter))
}

/// A small structured configuration showing every specification style.
pub fn example_configuration() -> &'static str {
    r#"header:
  engine: structured
  description: Contact sheet from the registration export
  output_delimiter: ","
columns:
  - column: Full name
    operation:
      type: concat
      values: [First, " ", Last]
  - column: City
    source: town
  - column: Country
    constant: Italy
  - column: Code
    operation:
      type: pad_start
      srcColumn: id
      length: 6
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_document() {
        let config = Configuration::from_yaml(example_configuration()).unwrap();

        assert_eq!(config.engine_kind().unwrap(), EngineKind::Structured);
        assert_eq!(config.columns.len(), 4);
        assert_eq!(config.columns[1].get("source"), Some(&Value::from("town")));
        assert_eq!(config.header.output_delimiter, Some(','));
    }

    #[test]
    fn test_column_order_is_declaration_order() {
        let config = Configuration::from_yaml(example_configuration()).unwrap();
        let names: Vec<_> = config
            .columns
            .iter()
            .filter_map(|c| c.get(COLUMN_TAG).and_then(Value::as_str))
            .collect();
        assert_eq!(names, vec!["Full name", "City", "Country", "Code"]);
    }

    #[test]
    fn test_missing_engine() {
        let err = Configuration::from_yaml("header: {}\ncolumns:\n  - column: A\n    source: a\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingEngine));
    }

    #[test]
    fn test_unknown_engine() {
        let err = Configuration::from_yaml("header:\n  engine: fancy\ncolumns:\n  - column: A\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownEngine(ref e) if e == "fancy"));
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let err = Configuration::from_yaml("columns:\n  - column: A\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::Yaml(_)));
    }

    #[test]
    fn test_no_columns() {
        let err = Configuration::from_yaml("header:\n  engine: 2\ncolumns: []\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::NoColumns));
    }

    #[test]
    fn test_non_ascii_delimiter() {
        let yaml = "header:\n  engine: 1\n  delimiter: \"é\"\ncolumns:\n  - column: A\n    source: a\n";
        let err = Configuration::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidDelimiter('é')));
    }

    #[test]
    fn test_quote_and_newline_delimiters_rejected() {
        let yaml = "header:\n  engine: 1\n  output_delimiter: '\"'\ncolumns:\n  - column: A\n    source: a\n";
        let err = Configuration::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidDelimiter('"')));

        for c in ['"', '\n', '\r'] {
            assert!(matches!(check_delimiter(c), Err(ConfigurationError::InvalidDelimiter(d)) if d == c));
        }
    }

    #[test]
    fn test_check_delimiter() {
        assert_eq!(check_delimiter(';').unwrap(), b';');
        assert_eq!(check_delimiter('\t').unwrap(), b'\t');
    }
}
