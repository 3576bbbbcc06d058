//! Template filters.
//!
//! | Filter | Argument | Effect |
//! |--------|----------|--------|
//! | upper | - | Convert to uppercase |
//! | lower | - | Convert to lowercase |
//! | trim | - | Remove leading/trailing whitespace |
//! | truncate | length | Keep the first N characters |
//! | default | text | Use text when the value is blank |
//! | prefix | text | Add prefix if not present |
//! | suffix | text | Add suffix if not present |
//! | digits | - | Keep only ASCII digits |
//! | pad | length | Left-pad with "0" to N characters |
//!
//! Filters take their single argument positionally (`truncate:10`).

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::error::{ConfigurationError, ConfigurationResult, FillResult};
use crate::operation::coerce::{into_count, into_string, ValueKind};
use crate::operation::params::{fill_positional, parameter_infos, Configurable, Parameter, ParameterInfo};

/// A pure string-to-string step attached to a template field.
pub trait Filter: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, input: String) -> String;

    /// Filter as written in a template.
    fn summary(&self) -> String {
        self.name().to_string()
    }
}

/// A concrete filter type available to the template engine.
pub trait FilterKind: Filter + Configurable + Default + 'static {
    /// Catalog name, matched case-insensitively.
    const NAME: &'static str;
    const DESCRIPTION: &'static str;
}

type PositionalBuilder = fn(Vec<Value>) -> FillResult<Box<dyn Filter>>;

fn build_positional<F: FilterKind>(args: Vec<Value>) -> FillResult<Box<dyn Filter>> {
    let mut filter = F::default();
    fill_positional(&mut filter, args)?;
    Ok(Box::new(filter))
}

/// Catalog entry for one filter type.
#[derive(Clone)]
pub struct FilterEntry {
    name: &'static str,
    description: &'static str,
    parameters: Vec<ParameterInfo>,
    build: PositionalBuilder,
}

impl fmt::Debug for FilterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEntry")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl FilterEntry {
    pub fn of<F: FilterKind>() -> Self {
        Self {
            name: F::NAME,
            description: F::DESCRIPTION,
            parameters: parameter_infos::<F>(),
            build: build_positional::<F>,
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

    /// Number of positional arguments the filter accepts.
    pub fn arity(&self) -> usize {
        self.parameters.iter().filter(|p| p.position.is_some()).count()
    }

    /// Build a filter from positional arguments.
    pub fn build(&self, args: Vec<Value>) -> FillResult<Box<dyn Filter>> {
        (self.build)(args)
    }
}

/// Case-insensitive name -> filter type catalog.
#[derive(Debug, Default)]
pub struct FilterCatalog {
    entries: Vec<FilterEntry>,
    index: HashMap<String, usize>,
}

impl FilterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the built-in filters.
    pub fn builtin() -> ConfigurationResult<Self> {
        let mut catalog = Self::new();
        for entry in builtin_filters() {
            catalog.register(entry)?;
        }
        Ok(catalog)
    }

    pub fn register(&mut self, entry: FilterEntry) -> ConfigurationResult<()> {
        let key = entry.name().trim().to_lowercase();
        if key.is_empty() {
            return Err(ConfigurationError::BlankName);
        }
        if self.index.contains_key(&key) {
            return Err(ConfigurationError::DuplicateName {
                kind: "filter",
                name: entry.name().to_string(),
            });
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<&FilterEntry> {
        self.index
            .get(&name.trim().to_lowercase())
            .and_then(|&i| self.entries.get(i))
    }

    pub fn entries(&self) -> impl Iterator<Item = &FilterEntry> {
        self.entries.iter()
    }
}

/// Every built-in filter, in registration order.
pub fn builtin_filters() -> Vec<FilterEntry> {
    vec![
        FilterEntry::of::<Upper>(),
        FilterEntry::of::<Lower>(),
        FilterEntry::of::<Trim>(),
        FilterEntry::of::<Truncate>(),
        FilterEntry::of::<DefaultText>(),
        FilterEntry::of::<Prefix>(),
        FilterEntry::of::<Suffix>(),
        FilterEntry::of::<Digits>(),
        FilterEntry::of::<Pad>(),
    ]
}

// =============================================================================
// Argument-less filters
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Upper;

impl Filter for Upper {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, input: String) -> String {
        input.to_uppercase()
    }
}

impl Configurable for Upper {
    fn parameters() -> Vec<Parameter<Self>> {
        Vec::new()
    }
}

impl FilterKind for Upper {
    const NAME: &'static str = "upper";
    const DESCRIPTION: &'static str = "Convert to uppercase";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Lower;

impl Filter for Lower {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, input: String) -> String {
        input.to_lowercase()
    }
}

impl Configurable for Lower {
    fn parameters() -> Vec<Parameter<Self>> {
        Vec::new()
    }
}

impl FilterKind for Lower {
    const NAME: &'static str = "lower";
    const DESCRIPTION: &'static str = "Convert to lowercase";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Trim;

impl Filter for Trim {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, input: String) -> String {
        input.trim().to_string()
    }
}

impl Configurable for Trim {
    fn parameters() -> Vec<Parameter<Self>> {
        Vec::new()
    }
}

impl FilterKind for Trim {
    const NAME: &'static str = "trim";
    const DESCRIPTION: &'static str = "Remove leading/trailing whitespace";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Digits;

impl Filter for Digits {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, input: String) -> String {
        input.chars().filter(|c| c.is_ascii_digit()).collect()
    }
}

impl Configurable for Digits {
    fn parameters() -> Vec<Parameter<Self>> {
        Vec::new()
    }
}

impl FilterKind for Digits {
    const NAME: &'static str = "digits";
    const DESCRIPTION: &'static str = "Keep only digits";
}

// =============================================================================
// Filters with one argument
// =============================================================================

/// Keep the first `length` characters.
#[derive(Debug, Clone, Default)]
pub struct Truncate {
    length: usize,
}

impl Truncate {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Filter for Truncate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, input: String) -> String {
        input.chars().take(self.length).collect()
    }

    fn summary(&self) -> String {
        format!("{}:{}", Self::NAME, self.length)
    }
}

impl Configurable for Truncate {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![Parameter::required("length", "length", ValueKind::Integer, |f: &mut Self, v: Value| {
            f.length = into_count(v)?;
            Ok(())
        })
        .at(0)
        .describe("Maximum number of characters")]
    }
}

impl FilterKind for Truncate {
    const NAME: &'static str = "truncate";
    const DESCRIPTION: &'static str = "Keep the first N characters";
}

/// Replacement for blank values.
#[derive(Debug, Clone, Default)]
pub struct DefaultText {
    value: String,
}

impl Filter for DefaultText {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, input: String) -> String {
        if input.trim().is_empty() {
            self.value.clone()
        } else {
            input
        }
    }

    fn summary(&self) -> String {
        format!("{}:{:?}", Self::NAME, self.value)
    }
}

impl Configurable for DefaultText {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![Parameter::required("value", "value", ValueKind::String, |f: &mut Self, v: Value| {
            f.value = into_string(v)?;
            Ok(())
        })
        .at(0)
        .describe("Text used when the value is blank")]
    }
}

impl FilterKind for DefaultText {
    const NAME: &'static str = "default";
    const DESCRIPTION: &'static str = "Use a fallback when the value is blank";
}

/// Ensure a prefix.
#[derive(Debug, Clone, Default)]
pub struct Prefix {
    value: String,
}

impl Filter for Prefix {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, input: String) -> String {
        if input.starts_with(&self.value) {
            input
        } else {
            format!("{}{}", self.value, input)
        }
    }

    fn summary(&self) -> String {
        format!("{}:{:?}", Self::NAME, self.value)
    }
}

impl Configurable for Prefix {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![Parameter::required("value", "value", ValueKind::String, |f: &mut Self, v: Value| {
            f.value = into_string(v)?;
            Ok(())
        })
        .at(0)
        .describe("Prefix string")]
    }
}

impl FilterKind for Prefix {
    const NAME: &'static str = "prefix";
    const DESCRIPTION: &'static str = "Add prefix if not present";
}

/// Ensure a suffix.
#[derive(Debug, Clone, Default)]
pub struct Suffix {
    value: String,
}

impl Filter for Suffix {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, input: String) -> String {
        if input.ends_with(&self.value) {
            input
        } else {
            format!("{}{}", input, self.value)
        }
    }

    fn summary(&self) -> String {
        format!("{}:{:?}", Self::NAME, self.value)
    }
}

impl Configurable for Suffix {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![Parameter::required("value", "value", ValueKind::String, |f: &mut Self, v: Value| {
            f.value = into_string(v)?;
            Ok(())
        })
        .at(0)
        .describe("Suffix string")]
    }
}

impl FilterKind for Suffix {
    const NAME: &'static str = "suffix";
    const DESCRIPTION: &'static str = "Add suffix if not present";
}

/// Left-pad with zeros.
#[derive(Debug, Clone, Default)]
pub struct Pad {
    length: usize,
}

impl Filter for Pad {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, input: String) -> String {
        let missing = self.length.saturating_sub(input.chars().count());
        format!("{}{}", "0".repeat(missing), input)
    }

    fn summary(&self) -> String {
        format!("{}:{}", Self::NAME, self.length)
    }
}

impl Configurable for Pad {
    fn parameters() -> Vec<Parameter<Self>> {
        vec![Parameter::required("length", "length", ValueKind::Integer, |f: &mut Self, v: Value| {
            f.length = into_count(v)?;
            Ok(())
        })
        .at(0)
        .describe("Target length")]
    }
}

impl FilterKind for Pad {
    const NAME: &'static str = "pad";
    const DESCRIPTION: &'static str = "Left-pad with zeros";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PropertyFillError;
    use serde_json::json;

    fn run(name: &str, args: Vec<Value>, input: &str) -> String {
        let catalog = FilterCatalog::builtin().unwrap();
        let filter = catalog.resolve(name).unwrap().build(args).unwrap();
        filter.apply(input.to_string())
    }

    #[test]
    fn test_case_and_trim() {
        assert_eq!(run("upper", vec![], "ada"), "ADA");
        assert_eq!(run("LOWER", vec![], "ADA"), "ada");
        assert_eq!(run("trim", vec![], "  ada \t"), "ada");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(run("truncate", vec![json!("3")], "Lovelace"), "Lov");
        assert_eq!(run("truncate", vec![json!("2")], "été"), "ét");
        assert_eq!(run("truncate", vec![json!("20")], "Ada"), "Ada");
    }

    #[test]
    fn test_default_only_replaces_blank() {
        assert_eq!(run("default", vec![json!("n/a")], "  "), "n/a");
        assert_eq!(run("default", vec![json!("n/a")], "Ada"), "Ada");
    }

    #[test]
    fn test_prefix_and_suffix_are_idempotent() {
        assert_eq!(run("prefix", vec![json!("T")], "123"), "T123");
        assert_eq!(run("prefix", vec![json!("T")], "T123"), "T123");
        assert_eq!(run("suffix", vec![json!(".csv")], "out"), "out.csv");
        assert_eq!(run("suffix", vec![json!(".csv")], "out.csv"), "out.csv");
    }

    #[test]
    fn test_digits_and_pad() {
        assert_eq!(run("digits", vec![], "T-123.456"), "123456");
        assert_eq!(run("pad", vec![json!("5")], "42"), "00042");
    }

    #[test]
    fn test_missing_argument() {
        let catalog = FilterCatalog::builtin().unwrap();
        let err = catalog.resolve("truncate").unwrap().build(vec![]).unwrap_err();
        assert!(matches!(err, PropertyFillError::Missing(ref p) if p == "length"));
    }

    #[test]
    fn test_non_numeric_argument() {
        let catalog = FilterCatalog::builtin().unwrap();
        let err = catalog.resolve("pad").unwrap().build(vec![json!("ten")]).unwrap_err();
        assert!(matches!(err, PropertyFillError::Conversion { .. }));
    }

    #[test]
    fn test_duplicate_filter_name() {
        let mut catalog = FilterCatalog::new();
        catalog.register(FilterEntry::of::<Upper>()).unwrap();
        let err = catalog.register(FilterEntry::of::<Upper>()).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateName { kind: "filter", .. }));
    }

    #[test]
    fn test_arity() {
        let catalog = FilterCatalog::builtin().unwrap();
        assert_eq!(catalog.resolve("upper").unwrap().arity(), 0);
        assert_eq!(catalog.resolve("truncate").unwrap().arity(), 1);
    }
}
