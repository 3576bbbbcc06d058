//! Error types for the reorganisation pipeline.
//!
//! One enum per failure family:
//!
//! - [`ConfigurationError`] - broken catalog or configuration header (fatal at startup)
//! - [`ImportError`] - one column specification could not be turned into an operation
//! - [`PropertyFillError`] - a declared parameter was missing or had the wrong shape
//! - [`ConversionError`] - a value could not be coerced to a parameter type
//! - [`OperationBuildingError`] - a fixed-shape node was asked to change shape
//! - [`EvaluationError`] - a row could not be evaluated
//! - [`CsvError`] - input decoding or parsing failed
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while building catalogs or reading the configuration header.
///
/// These always abort the run before any row is processed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// An operation or filter type declared an empty name.
    #[error("Operation type with blank name in catalog")]
    BlankName,

    /// Two catalog entries share a name (case-insensitive).
    #[error("Duplicate {kind} name '{name}' in catalog")]
    DuplicateName { kind: &'static str, name: String },

    /// A shortcut keyword was registered twice.
    #[error("Shortcut keyword '{keyword}' already bound to {existing}.{property}")]
    DuplicateShortcut {
        keyword: String,
        existing: String,
        property: String,
    },

    /// A shortcut points at a property its operation type does not declare.
    #[error("Shortcut '{keyword}' of operation '{operation}' references unknown property '{property}'")]
    UnknownShortcutProperty {
        keyword: String,
        operation: String,
        property: String,
    },

    /// The header does not select an engine.
    #[error("No engine selected in configuration header")]
    MissingEngine,

    /// The header selects an engine that does not exist.
    #[error("Unknown engine '{0}' (expected 1/structured or 2/template)")]
    UnknownEngine(String),

    /// A shortcut keyword collides with a reserved column tag.
    #[error("Shortcut keyword '{0}' is a reserved tag")]
    ReservedKeyword(String),

    /// A delimiter is not a single ASCII character.
    #[error("Delimiter '{0}' is not an ASCII character")]
    InvalidDelimiter(char),

    /// The configuration declares no output columns.
    #[error("Configuration declares no columns")]
    NoColumns,

    /// The YAML document could not be read.
    #[error("Invalid configuration document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Column Import Errors
// =============================================================================

/// Errors in the shape of one column specification.
///
/// Every variant names the offending column so the user can fix the
/// configuration and retry.
#[derive(Debug, Error)]
pub enum ImportError {
    /// A mandatory key is absent.
    #[error("Column '{column}': missing mandatory tag '{tag}'")]
    MissingTag { column: String, tag: &'static str },

    /// The column name is empty or not a string.
    #[error("Column '{column}': invalid column name")]
    InvalidColumnName { column: String },

    /// The operation block names a type the registry does not know.
    #[error("Column '{column}': unknown operation type '{operation}'")]
    UnknownOperation { column: String, operation: String },

    /// The operation block is not a mapping or lacks a type.
    #[error("Column '{column}': malformed operation block: {message}")]
    MalformedOperation { column: String, message: String },

    /// Neither an operation block nor a shortcut key is present.
    #[error("Column '{column}': no operation block and no shortcut key (expected one of: {})", .keywords.join(", "))]
    NoMatchingShortcut { column: String, keywords: Vec<String> },

    /// More than one specification style is present.
    #[error("Column '{column}': {message}")]
    MixedStyles { column: String, message: String },

    /// Property filling failed for an explicit operation block.
    #[error("Column '{column}': {source}")]
    Fill {
        column: String,
        #[source]
        source: PropertyFillError,
    },

    /// A shortcut could not be instantiated.
    #[error("Column '{column}': shortcut '{keyword}' failed: {source}")]
    Shortcut {
        column: String,
        keyword: String,
        #[source]
        source: PropertyFillError,
    },

    /// The template string could not be parsed.
    #[error("Column '{column}': invalid template: {message}")]
    Template { column: String, message: String },

    /// A template references a filter that does not exist.
    #[error("Column '{column}': unknown filter '{filter}'")]
    UnknownFilter { column: String, filter: String },

    /// A filter argument could not be bound.
    #[error("Column '{column}': filter '{filter}': {source}")]
    FilterFill {
        column: String,
        filter: String,
        #[source]
        source: PropertyFillError,
    },

    /// The operation tree could not be assembled.
    #[error("Column '{column}': {source}")]
    Building {
        column: String,
        #[source]
        source: OperationBuildingError,
    },
}

// =============================================================================
// Property Filling Errors
// =============================================================================

/// Errors while binding supplied values to declared parameters.
#[derive(Debug, Error)]
pub enum PropertyFillError {
    /// A required parameter was not supplied.
    #[error("mandatory property '{0}' not provided")]
    Missing(String),

    /// A supplied value could not be converted to the parameter type.
    #[error("property '{property}': {source}")]
    Conversion {
        property: String,
        #[source]
        source: ConversionError,
    },
}

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors while coercing a value to a parameter type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// The value/type pairing is not one of the supported conversions.
    #[error("unsupported conversion from {from} to {to}")]
    Unsupported { from: &'static str, to: &'static str },

    /// A string could not be parsed as an integer.
    #[error("'{0}' is not a valid integer")]
    NotNumeric(String),

    /// A count (length, index) was negative.
    #[error("'{0}' must not be negative")]
    Negative(i64),

    /// A character parameter was not exactly one character.
    #[error("'{0}' is not a single character")]
    NotSingleChar(String),

    /// A regular expression parameter did not compile.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

// =============================================================================
// Operation Building Errors
// =============================================================================

/// Attempts to violate the fixed shape of an operation node.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationBuildingError {
    /// Constants take neither children nor filters.
    #[error("constant operation cannot have {0}")]
    Constant(&'static str),

    /// Source leaves read a single field and take no children.
    #[error("source operation '{0}' cannot have children")]
    LeafChildren(String),

    /// Composite nodes concatenate children and take no filters.
    #[error("composite operation cannot have filters")]
    CompositeFilters,
}

// =============================================================================
// Evaluation Errors
// =============================================================================

/// Errors while evaluating an operation against a row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    /// The row has no field with this name.
    #[error("Missing source column: {0}")]
    MissingColumn(String),

    /// A composite node has neither a source nor children.
    #[error("operation '{0}' has neither a source nor children")]
    Unresolved(String),
}

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading input datasets.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors returned by the pipeline and surfaced by the CLI.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Catalog or header problem.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Column specification problem.
    #[error("Configuration import error: {0}")]
    Import(#[from] ImportError),

    /// Input reading problem.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// A row could not be evaluated.
    #[error("Row {row}, column '{column}': {source}")]
    Evaluation {
        row: usize,
        column: String,
        #[source]
        source: EvaluationError,
    },

    /// Writing CSV output failed.
    #[error("Output error: {0}")]
    Output(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for catalog and header operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

/// Result type for column import.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type for property filling.
pub type FillResult<T> = Result<T, PropertyFillError>;

/// Result type for row evaluation.
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Result type for CSV input.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let import_err = ImportError::UnknownOperation {
            column: "Full".into(),
            operation: "frobnicate".into(),
        };
        let pipeline_err: PipelineError = import_err.into();
        assert!(pipeline_err.to_string().contains("frobnicate"));
        assert!(pipeline_err.to_string().contains("Full"));
    }

    #[test]
    fn test_fill_error_names_property() {
        let err = PropertyFillError::Missing("srcColumn".into());
        assert_eq!(err.to_string(), "mandatory property 'srcColumn' not provided");
    }

    #[test]
    fn test_no_matching_shortcut_lists_keywords() {
        let err = ImportError::NoMatchingShortcut {
            column: "X".into(),
            keywords: vec!["source".into(), "concat".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'X'"));
        assert!(msg.contains("source, concat"));
    }

    #[test]
    fn test_evaluation_error_format() {
        let err = PipelineError::Evaluation {
            row: 3,
            column: "City".into(),
            source: EvaluationError::MissingColumn("town".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 3"));
        assert!(msg.contains("town"));
    }
}
