//! # Reorg - rule-driven CSV column reorganisation
//!
//! Reorg reads one or more CSV datasets and builds a new dataset whose
//! columns are computed by user-declared rules from a YAML configuration.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  YAML rules │────▶│   Engine    │────▶│ Column plan │────▶│ CSV / JSON  │
//! │  CSV files  │     │ (structured │     │ (operation  │     │   output    │
//! │  (ISO/UTF8) │     │  /template) │     │   trees)    │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use reorg::{transform_rows, Configuration, Row};
//!
//! let config = Configuration::from_yaml(r#"
//! header:
//!   engine: structured
//! columns:
//!   - column: City
//!     source: town
//! "#).unwrap();
//!
//! let rows: Vec<Row> = vec![[("town", "Turin")].into_iter().collect()];
//! let result = transform_rows(&config, &rows).unwrap();
//! assert_eq!(result.records[0][0], "Turin");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logs`] - Broadcast logging
//! - [`models`] - Input rows
//! - [`parser`] - CSV parsing with auto-detection
//! - [`config`] - YAML configuration documents
//! - [`operation`] - Operation contract, parameters, registry, shortcuts
//! - [`engine`] - Structured and template engines
//! - [`transform`] - Executor and pipeline

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod config;
pub mod parser;

// Operations and engines
pub mod engine;
pub mod operation;

// Transformation
pub mod transform;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigurationError, ConversionError, CsvError, EvaluationError, ImportError, OperationBuildingError,
    PipelineError, PipelineResult, PropertyFillError,
};

// =============================================================================
// Re-exports - Models and parsing
// =============================================================================

pub use models::Row;
pub use parser::{decode_content, detect_delimiter, detect_encoding, parse_bytes, parse_file, parse_str, ParseResult};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{ColumnSpec, Configuration, Header};

// =============================================================================
// Re-exports - Operations and engines
// =============================================================================

pub use engine::{build_engine, catalog_description, Engine, EngineKind, StructuredEngine, TemplateEngine};
pub use operation::{evaluate, render_tree, Operation, OperationRegistry, ShortcutResolver};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    execute, transform_files, transform_rows, write_output, ColumnPlan, OutputFormat, PipelineOutput,
    TransformOptions, TransformResult,
};
