//! Template engine.
//!
//! A column is a string template. `{{ field }}` reads a field of the row,
//! filters are piped after it, and text outside the braces is kept as is:
//!
//! ```yaml
//! - column: Label
//!   template: "{{ name | upper | truncate:10 }} ({{ town }})"
//! ```
//!
//! Filter arguments may be quoted with `"` or `'` to carry `|` or `:`.

pub mod filters;
pub mod node;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{column_name, Engine, EngineKind};
use crate::config::{ColumnSpec, COLUMN_TAG, OPERATION_TAG, TEMPLATE_TAG};
use crate::error::{ConfigurationResult, ImportError, ImportResult};
use crate::logs::{log_debug, log_warning};
use crate::operation::coerce::into_string;
use crate::operation::Operation;

pub use filters::{Filter, FilterCatalog, FilterEntry, FilterKind};
pub use node::TemplateNode;

static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("reference pattern is valid"));

const OPEN: &str = "{{";

/// Engine for `{{ field | filter }}` templates.
#[derive(Debug)]
pub struct TemplateEngine {
    filters: FilterCatalog,
}

impl TemplateEngine {
    /// Engine over the built-in filters.
    pub fn new() -> ConfigurationResult<Self> {
        Ok(Self::with_filters(FilterCatalog::builtin()?))
    }

    pub fn with_filters(filters: FilterCatalog) -> Self {
        Self { filters }
    }

    pub fn filters(&self) -> &FilterCatalog {
        &self.filters
    }

    /// Parse `template` into a tree rooted at a composite named `column`.
    pub fn parse_template(&self, column: &str, template: &str) -> ImportResult<TemplateNode> {
        let mut root = TemplateNode::composite(column);
        let mut children = Vec::new();
        let mut last = 0;

        for captures in REFERENCE.captures_iter(template) {
            let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            push_literal(&mut children, &template[last..whole.start()]);
            if inner.as_str().contains(OPEN) {
                return Err(template_error(column, format!("nested '{{{{' in '{}'", whole.as_str())));
            }
            children.push(self.parse_reference(column, inner.as_str())?);
            last = whole.end();
        }

        let tail = &template[last..];
        if tail.contains(OPEN) {
            return Err(template_error(column, "unterminated '{{' reference".to_string()));
        }

        if children.is_empty() {
            children.push(TemplateNode::constant(template));
        } else {
            push_literal(&mut children, tail);
        }

        root.set_children(children)
            .map_err(|source| ImportError::Building {
                column: column.to_string(),
                source,
            })?;
        Ok(root)
    }

    /// `field | filter | filter:arg` -> leaf with its filter chain.
    fn parse_reference(&self, column: &str, inner: &str) -> ImportResult<TemplateNode> {
        let mut segments = split_unquoted(inner, '|').into_iter();
        let source = segments.next().map(str::trim).unwrap_or_default();
        if source.is_empty() {
            return Err(template_error(column, format!("empty field reference '{{{{{}}}}}'", inner)));
        }

        let mut leaf = TemplateNode::leaf(source);
        for segment in segments {
            let parts = split_unquoted(segment, ':');
            let head = parts.first().copied().unwrap_or_default();
            let name = head.trim();
            let arg = (parts.len() > 1).then(|| unquote(&segment[head.len() + 1..]));
            if name.is_empty() {
                return Err(template_error(column, format!("empty filter after '{}'", source)));
            }

            let entry = self.filters.resolve(name).ok_or_else(|| ImportError::UnknownFilter {
                column: column.to_string(),
                filter: name.to_string(),
            })?;
            if arg.is_some() && entry.arity() == 0 {
                return Err(template_error(column, format!("filter '{}' takes no argument", entry.name())));
            }

            let args: Vec<Value> = arg.into_iter().map(Value::String).collect();
            let filter = entry.build(args).map_err(|source| ImportError::FilterFill {
                column: column.to_string(),
                filter: entry.name().to_string(),
                source,
            })?;
            leaf.add_filter(filter).map_err(|source| ImportError::Building {
                column: column.to_string(),
                source,
            })?;
        }
        Ok(leaf)
    }
}

impl Engine for TemplateEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Template
    }

    fn parse_column(&self, spec: &ColumnSpec) -> ImportResult<Box<dyn Operation>> {
        let column = column_name(spec)?;

        if spec.contains_key(OPERATION_TAG) {
            return Err(ImportError::MixedStyles {
                column,
                message: format!("'{}' blocks are not accepted by the template engine", OPERATION_TAG),
            });
        }
        let raw = match spec.get(TEMPLATE_TAG) {
            None | Some(Value::Null) => {
                return Err(ImportError::MissingTag {
                    column,
                    tag: TEMPLATE_TAG,
                })
            }
            Some(raw) => raw.clone(),
        };
        let template = into_string(raw).map_err(|e| template_error(&column, e.to_string()))?;

        for key in spec.keys() {
            if key != COLUMN_TAG && key != TEMPLATE_TAG {
                log_warning(format!("Column '{}': key '{}' ignored by the template engine", column, key));
            }
        }

        log_debug(format!("Column '{}': template {:?}", column, template));
        Ok(Box::new(self.parse_template(&column, &template)?))
    }

    fn describe(&self) -> String {
        let mut out = String::from("| Filter | Argument | Description |\n|--------|----------|-------------|\n");
        for entry in self.filters.entries() {
            let arg = entry
                .parameters()
                .iter()
                .map(|p| format!("{}: {}", p.property, p.kind))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                entry.name(),
                if arg.is_empty() { "-".to_string() } else { arg },
                entry.description()
            ));
        }
        out.push_str(&format!(
            "\nEvery column needs '{}' and '{}', e.g. \"{{{{ name | upper | truncate:10 }}}}\".",
            COLUMN_TAG, TEMPLATE_TAG
        ));
        out
    }
}

fn push_literal(children: &mut Vec<TemplateNode>, text: &str) {
    if !text.is_empty() {
        children.push(TemplateNode::constant(text));
    }
}

fn template_error(column: &str, message: String) -> ImportError {
    ImportError::Template {
        column: column.to_string(),
        message,
    }
}

/// Split on `separator` outside of `"..."` / `'...'` quotes.
fn split_unquoted(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == separator => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            None => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn unquote(arg: &str) -> String {
    let trimmed = arg.trim();
    for q in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(q) && trimmed.ends_with(q) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}
