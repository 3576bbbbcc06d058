//! Operations: the executable nodes that compute one output value per row.
//!
//! This module provides:
//! - [`Operation`]: the contract every engine's output implements
//! - `coerce`: closed-set value coercion used by parameter binding
//! - `params`: parameter declarations and keyed/positional property filling
//! - `registry`: the name -> constructor catalog of structured operation types
//! - `shortcut`: single-value aliases for operation types
//! - `catalog`: the built-in operation types
//!
//! ## Usage Flow
//!
//! ```text
//! column spec → Engine → Box<dyn Operation> → evaluate(row) → String
//! ```

pub mod catalog;
pub mod coerce;
pub mod params;
pub mod registry;
pub mod shortcut;

use std::fmt;

use crate::error::EvaluationResult;
use crate::models::Row;

pub use coerce::{coerce, ValueKind};
pub use params::{fill_keyed, fill_positional, Configurable, Parameter, ParameterInfo};
pub use registry::{OperationEntry, OperationKind, OperationRegistry, ShortcutDecl};
pub use shortcut::{ShortcutEntry, ShortcutResolver};

/// An executable node producing one string value from a row.
///
/// Instances are immutable once built and evaluation has no side effects,
/// so one tree can be evaluated against many rows from several threads.
pub trait Operation: fmt::Debug + Send + Sync {
    /// Output column name; empty for nested nodes.
    fn name(&self) -> &str;

    /// Short label of the node type.
    fn kind(&self) -> &str;

    /// Compute the value for `row`.
    fn evaluate(&self, row: &Row) -> EvaluationResult<String>;

    /// Ordered sub-operations, if any.
    fn children(&self) -> Vec<&dyn Operation> {
        Vec::new()
    }

    /// Declared parameters, if any.
    fn parameters(&self) -> Vec<ParameterInfo> {
        Vec::new()
    }

    /// One-line description used by tree listings.
    fn summary(&self) -> String {
        format!("{:?}", self)
    }
}

/// Evaluate `operation` against `row`.
pub fn evaluate(operation: &dyn Operation, row: &Row) -> EvaluationResult<String> {
    operation.evaluate(row)
}

/// Render an operation tree, one node per line, children indented.
pub fn render_tree(operation: &dyn Operation) -> Vec<String> {
    let mut lines = Vec::new();
    render_node(operation, 0, &mut lines);
    lines
}

fn render_node(operation: &dyn Operation, depth: usize, lines: &mut Vec<String>) {
    let pad = "  ".repeat(depth);
    if operation.name().is_empty() {
        lines.push(format!("{}- {}", pad, operation.summary()));
    } else {
        lines.push(format!("{}{} [{}]: {}", pad, operation.name(), operation.kind(), operation.summary()));
    }
    for child in operation.children() {
        render_node(child, depth + 1, lines);
    }
}
