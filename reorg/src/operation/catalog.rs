//! Built-in operation types for the structured engine.
//!
//! | Type | Parameters | Shortcut |
//! |------|------------|----------|
//! | get | srcColumn | `source` |
//! | concat | values, separator, skipEmpty | `concat` |
//! | constant | value | `constant` |
//! | uppercase | srcColumn | `upper` |
//! | lowercase | srcColumn | `lower` |
//! | replace | srcColumn, pattern, value | - |
//! | substring | srcColumn, start, length | - |
//! | pad_start | srcColumn, length, char | - |

use regex::Regex;
use serde_json::Value;

use super::coerce::{into_bool, into_count, into_string, into_string_list, ValueKind};
use super::params::{parameter_infos, Configurable, Parameter, ParameterInfo};
use super::registry::{OperationEntry, OperationKind, ShortcutDecl};
use super::Operation;
use crate::error::{ConversionError, EvaluationResult};
use crate::models::Row;

/// Every built-in type, in registration order.
///
/// Registration order is also shortcut precedence when a column matches
/// several shortcut keywords.
pub fn builtin_operations() -> Vec<OperationEntry> {
    vec![
        OperationEntry::of::<Get>(),
        OperationEntry::of::<Concat>(),
        OperationEntry::of::<Constant>(),
        OperationEntry::of::<Uppercase>(),
        OperationEntry::of::<Lowercase>(),
        OperationEntry::of::<Replace>(),
        OperationEntry::of::<Substring>(),
        OperationEntry::of::<PadStart>(),
    ]
}

/// Operations reading one source column.
trait SourceColumn {
    fn src_column_mut(&mut self) -> &mut String;
}

fn src_column_param<O: SourceColumn>() -> Parameter<O> {
    Parameter::required("srcColumn", "src_column", ValueKind::String, |op: &mut O, v: Value| {
        *op.src_column_mut() = into_string(v)?;
        Ok(())
    })
    .describe("Source column to read")
}

// =============================================================================
// get
// =============================================================================

/// Copy a source column unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Get {
    name: String,
    src_column: String,
}

impl SourceColumn for Get {
    fn src_column_mut(&mut self) -> &mut String {
        &mut self.src_column
    }
}

impl Configurable for Get {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![src_column_param()]
    }
}

impl OperationKind for Get {
    const TYPE_NAME: &'static str = "get";
    const DESCRIPTION: &'static str = "Copy the value of a source column";
    const SHORTCUT: Option<ShortcutDecl> = Some(ShortcutDecl {
        keyword: "source",
        property: "srcColumn",
    });

    fn named(column: &str) -> Self {
        Self {
            name: column.to_string(),
            src_column: String::new(),
        }
    }
}

impl Operation for Get {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        Self::TYPE_NAME
    }

    fn evaluate(&self, row: &Row) -> EvaluationResult<String> {
        row.field(&self.src_column).map(str::to_string)
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        parameter_infos::<Self>()
    }
}

// =============================================================================
// concat
// =============================================================================

/// Join values; a value naming a column of the row reads that column,
/// anything else is taken literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concat {
    name: String,
    values: Vec<String>,
    separator: String,
    skip_empty: bool,
}

impl Configurable for Concat {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![
            Parameter::required("values", "values", ValueKind::StringList, |op: &mut Self, v: Value| {
                op.values = into_string_list(v)?;
                Ok(())
            })
            .describe("Column names or literal text, in output order"),
            Parameter::optional("separator", "separator", ValueKind::String, |op: &mut Self, v: Value| {
                op.separator = into_string(v)?;
                Ok(())
            })
            .describe("Inserted between values (default: none)"),
            Parameter::optional("skipEmpty", "skip_empty", ValueKind::Boolean, |op: &mut Self, v: Value| {
                op.skip_empty = into_bool(v)?;
                Ok(())
            })
            .describe("Drop empty values before joining"),
        ]
    }
}

impl OperationKind for Concat {
    const TYPE_NAME: &'static str = "concat";
    const DESCRIPTION: &'static str = "Concatenate columns and literal text";
    const SHORTCUT: Option<ShortcutDecl> = Some(ShortcutDecl {
        keyword: "concat",
        property: "values",
    });

    fn named(column: &str) -> Self {
        Self {
            name: column.to_string(),
            values: Vec::new(),
            separator: String::new(),
            skip_empty: false,
        }
    }
}

impl Operation for Concat {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        Self::TYPE_NAME
    }

    fn evaluate(&self, row: &Row) -> EvaluationResult<String> {
        let parts: Vec<&str> = self
            .values
            .iter()
            .map(|v| row.get(v).unwrap_or(v))
            .filter(|s| !(self.skip_empty && s.trim().is_empty()))
            .collect();
        Ok(parts.join(&self.separator))
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        parameter_infos::<Self>()
    }
}

// =============================================================================
// constant
// =============================================================================

/// The same text on every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    name: String,
    value: String,
}

impl Configurable for Constant {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![Parameter::required("value", "value", ValueKind::String, |op: &mut Self, v: Value| {
            op.value = into_string(v)?;
            Ok(())
        })
        .describe("Text to emit")]
    }
}

impl OperationKind for Constant {
    const TYPE_NAME: &'static str = "constant";
    const DESCRIPTION: &'static str = "Emit a fixed value";
    const SHORTCUT: Option<ShortcutDecl> = Some(ShortcutDecl {
        keyword: "constant",
        property: "value",
    });

    fn named(column: &str) -> Self {
        Self {
            name: column.to_string(),
            value: String::new(),
        }
    }
}

impl Operation for Constant {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        Self::TYPE_NAME
    }

    fn evaluate(&self, _row: &Row) -> EvaluationResult<String> {
        Ok(self.value.clone())
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        parameter_infos::<Self>()
    }
}

// =============================================================================
// uppercase / lowercase
// =============================================================================

/// Source column converted to uppercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uppercase {
    name: String,
    src_column: String,
}

impl SourceColumn for Uppercase {
    fn src_column_mut(&mut self) -> &mut String {
        &mut self.src_column
    }
}

impl Configurable for Uppercase {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![src_column_param()]
    }
}

impl OperationKind for Uppercase {
    const TYPE_NAME: &'static str = "uppercase";
    const DESCRIPTION: &'static str = "Convert a source column to uppercase";
    const SHORTCUT: Option<ShortcutDecl> = Some(ShortcutDecl {
        keyword: "upper",
        property: "srcColumn",
    });

    fn named(column: &str) -> Self {
        Self {
            name: column.to_string(),
            src_column: String::new(),
        }
    }
}

impl Operation for Uppercase {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        Self::TYPE_NAME
    }

    fn evaluate(&self, row: &Row) -> EvaluationResult<String> {
        row.field(&self.src_column).map(str::to_uppercase)
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        parameter_infos::<Self>()
    }
}

/// Source column converted to lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lowercase {
    name: String,
    src_column: String,
}

impl SourceColumn for Lowercase {
    fn src_column_mut(&mut self) -> &mut String {
        &mut self.src_column
    }
}

impl Configurable for Lowercase {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![src_column_param()]
    }
}

impl OperationKind for Lowercase {
    const TYPE_NAME: &'static str = "lowercase";
    const DESCRIPTION: &'static str = "Convert a source column to lowercase";
    const SHORTCUT: Option<ShortcutDecl> = Some(ShortcutDecl {
        keyword: "lower",
        property: "srcColumn",
    });

    fn named(column: &str) -> Self {
        Self {
            name: column.to_string(),
            src_column: String::new(),
        }
    }
}

impl Operation for Lowercase {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        Self::TYPE_NAME
    }

    fn evaluate(&self, row: &Row) -> EvaluationResult<String> {
        row.field(&self.src_column).map(str::to_lowercase)
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        parameter_infos::<Self>()
    }
}

// =============================================================================
// replace
// =============================================================================

/// Regex replacement on a source column.
#[derive(Debug, Clone)]
pub struct Replace {
    name: String,
    src_column: String,
    pattern: Option<Regex>,
    value: String,
}

impl SourceColumn for Replace {
    fn src_column_mut(&mut self) -> &mut String {
        &mut self.src_column
    }
}

impl Configurable for Replace {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![
            src_column_param(),
            Parameter::required("pattern", "pattern", ValueKind::String, |op: &mut Self, v: Value| {
                let pattern = into_string(v)?;
                let regex = Regex::new(&pattern).map_err(|e| ConversionError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                op.pattern = Some(regex);
                Ok(())
            })
            .describe("Regular expression to match"),
            Parameter::optional("value", "value", ValueKind::String, |op: &mut Self, v: Value| {
                op.value = into_string(v)?;
                Ok(())
            })
            .describe("Replacement text (default: empty)"),
        ]
    }
}

impl OperationKind for Replace {
    const TYPE_NAME: &'static str = "replace";
    const DESCRIPTION: &'static str = "Replace regex matches in a source column";

    fn named(column: &str) -> Self {
        Self {
            name: column.to_string(),
            src_column: String::new(),
            pattern: None,
            value: String::new(),
        }
    }
}

impl Operation for Replace {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        Self::TYPE_NAME
    }

    fn evaluate(&self, row: &Row) -> EvaluationResult<String> {
        let input = row.field(&self.src_column)?;
        Ok(match &self.pattern {
            Some(re) => re.replace_all(input, self.value.as_str()).into_owned(),
            None => input.to_string(),
        })
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        parameter_infos::<Self>()
    }
}

// =============================================================================
// substring
// =============================================================================

/// Characters `start..start + length` of a source column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substring {
    name: String,
    src_column: String,
    start: usize,
    length: Option<usize>,
}

impl SourceColumn for Substring {
    fn src_column_mut(&mut self) -> &mut String {
        &mut self.src_column
    }
}

impl Configurable for Substring {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![
            src_column_param(),
            Parameter::required("start", "start", ValueKind::Integer, |op: &mut Self, v: Value| {
                op.start = into_count(v)?;
                Ok(())
            })
            .describe("Index of the first character (0-based)"),
            Parameter::optional("length", "length", ValueKind::Integer, |op: &mut Self, v: Value| {
                op.length = Some(into_count(v)?);
                Ok(())
            })
            .describe("Number of characters (default: to the end)"),
        ]
    }
}

impl OperationKind for Substring {
    const TYPE_NAME: &'static str = "substring";
    const DESCRIPTION: &'static str = "Extract part of a source column";

    fn named(column: &str) -> Self {
        Self {
            name: column.to_string(),
            src_column: String::new(),
            start: 0,
            length: None,
        }
    }
}

impl Operation for Substring {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        Self::TYPE_NAME
    }

    fn evaluate(&self, row: &Row) -> EvaluationResult<String> {
        let chars = row.field(&self.src_column)?.chars().skip(self.start);
        Ok(match self.length {
            Some(length) => chars.take(length).collect(),
            None => chars.collect(),
        })
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        parameter_infos::<Self>()
    }
}

// =============================================================================
// pad_start
// =============================================================================

/// Left-pad a source column to a target length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadStart {
    name: String,
    src_column: String,
    length: usize,
    pad: char,
}

impl SourceColumn for PadStart {
    fn src_column_mut(&mut self) -> &mut String {
        &mut self.src_column
    }
}

impl Configurable for PadStart {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![
            src_column_param(),
            Parameter::required("length", "length", ValueKind::Integer, |op: &mut Self, v: Value| {
                op.length = into_count(v)?;
                Ok(())
            })
            .describe("Target length in characters"),
            Parameter::optional("char", "pad", ValueKind::String, |op: &mut Self, v: Value| {
                let text = into_string(v)?;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => {
                        op.pad = c;
                        Ok(())
                    }
                    _ => Err(ConversionError::NotSingleChar(text)),
                }
            })
            .describe("Pad character (default: \"0\")"),
        ]
    }
}

impl OperationKind for PadStart {
    const TYPE_NAME: &'static str = "pad_start";
    const DESCRIPTION: &'static str = "Pad a source column at the start";

    fn named(column: &str) -> Self {
        Self {
            name: column.to_string(),
            src_column: String::new(),
            length: 0,
            pad: '0',
        }
    }
}

impl Operation for PadStart {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        Self::TYPE_NAME
    }

    fn evaluate(&self, row: &Row) -> EvaluationResult<String> {
        let input = row.field(&self.src_column)?;
        let missing = self.length.saturating_sub(input.chars().count());
        let mut padded: String = std::iter::repeat(self.pad).take(missing).collect();
        padded.push_str(input);
        Ok(padded)
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        parameter_infos::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvaluationError, PropertyFillError};
    use crate::operation::params::fill_keyed;
    use serde_json::{json, Map};

    fn build<O: OperationKind>(column: &str, props: Value) -> O {
        let mut op = O::named(column);
        let props: Map<String, Value> = props.as_object().cloned().unwrap();
        fill_keyed(&mut op, &props).unwrap();
        op
    }

    fn row() -> Row {
        [("First", "Ada"), ("Last", "Lovelace"), ("code", "T-123.456"), ("town", "Turin")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_concat_mixes_columns_and_literals() {
        let op: Concat = build("Full", json!({"values": ["First", " ", "Last"]}));
        assert_eq!(op.evaluate(&row()).unwrap(), "Ada Lovelace");
    }

    #[test]
    fn test_concat_separator_and_skip_empty() {
        let op: Concat = build(
            "Full",
            json!({"values": ["Last", "", "First"], "separator": ", ", "skipEmpty": true}),
        );
        assert_eq!(op.evaluate(&row()).unwrap(), "Lovelace, Ada");
    }

    #[test]
    fn test_get_missing_column() {
        let op: Get = build("City", json!({"srcColumn": "city"}));
        assert_eq!(
            op.evaluate(&row()),
            Err(EvaluationError::MissingColumn("city".into()))
        );
    }

    #[test]
    fn test_case_operations() {
        let upper: Uppercase = build("U", json!({"srcColumn": "town"}));
        let lower: Lowercase = build("L", json!({"srcColumn": "town"}));
        assert_eq!(upper.evaluate(&row()).unwrap(), "TURIN");
        assert_eq!(lower.evaluate(&row()).unwrap(), "turin");
    }

    #[test]
    fn test_replace() {
        let op: Replace = build("Code", json!({"srcColumn": "code", "pattern": "[-.]"}));
        assert_eq!(op.evaluate(&row()).unwrap(), "T123456");
    }

    #[test]
    fn test_replace_invalid_pattern() {
        let mut op = Replace::named("Code");
        let props = json!({"srcColumn": "code", "pattern": "("});
        let err = fill_keyed(&mut op, props.as_object().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            PropertyFillError::Conversion { source: ConversionError::InvalidPattern { .. }, .. }
        ));
    }

    #[test]
    fn test_substring_coerces_string_offsets() {
        let op: Substring = build("S", json!({"srcColumn": "Last", "start": "2", "length": 4}));
        assert_eq!(op.evaluate(&row()).unwrap(), "vela");

        let tail: Substring = build("S", json!({"srcColumn": "Last", "start": 4}));
        assert_eq!(tail.evaluate(&row()).unwrap(), "lace");
    }

    #[test]
    fn test_pad_start() {
        let op: PadStart = build("P", json!({"srcColumn": "First", "length": 5}));
        assert_eq!(op.evaluate(&row()).unwrap(), "00Ada");

        let star: PadStart = build("P", json!({"srcColumn": "First", "length": 2, "char": "*"}));
        assert_eq!(star.evaluate(&row()).unwrap(), "Ada");
    }

    #[test]
    fn test_pad_start_char_must_be_one_character() {
        for pad in ["", "ab"] {
            let mut op = PadStart::named("P");
            let props = json!({"srcColumn": "First", "length": 5, "char": pad});
            let err = fill_keyed(&mut op, props.as_object().unwrap()).unwrap_err();
            assert!(matches!(
                err,
                PropertyFillError::Conversion { source: ConversionError::NotSingleChar(ref s), .. } if s == pad
            ));
        }

        let accented: PadStart = build("P", json!({"srcColumn": "First", "length": 4, "char": "é"}));
        assert_eq!(accented.evaluate(&row()).unwrap(), "éAda");
    }

    #[test]
    fn test_constant() {
        let op: Constant = build("Country", json!({"value": "Italy"}));
        assert_eq!(op.evaluate(&Row::new()).unwrap(), "Italy");
    }

    #[test]
    fn test_every_shortcut_names_a_declared_property() {
        for entry in builtin_operations() {
            if let Some(decl) = entry.shortcut() {
                assert!(entry.parameter(decl.property).is_some(), "{}", entry.name());
            }
        }
    }
}
