//! Domain models shared by the parser, the engines and the executor.
//!
//! - [`Row`] - one input record with named-field lookup

use std::collections::HashMap;

use crate::error::{EvaluationError, EvaluationResult};

// =============================================================================
// Row
// =============================================================================

/// One input record.
///
/// Fields are looked up by header name. Rows are read-only once parsed, so
/// the same row can be handed to every column of the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: HashMap<String, String>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from parallel header and value slices.
    ///
    /// Missing trailing values become empty strings; extra values are ignored.
    pub fn from_record(headers: &[String], values: &[&str]) -> Self {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), values.get(i).copied().unwrap_or("").to_string()))
            .collect();
        Self { fields }
    }

    /// Look up a field, `None` when the row has no such column.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Look up a field that must exist.
    pub fn field(&self, name: &str) -> EvaluationResult<&str> {
        self.get(name)
            .ok_or_else(|| EvaluationError::MissingColumn(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
