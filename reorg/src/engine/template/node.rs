//! Operation tree produced by the template engine.

use super::filters::Filter;
use crate::error::{EvaluationError, EvaluationResult, OperationBuildingError};
use crate::models::Row;
use crate::operation::Operation;

type BuildResult = Result<(), OperationBuildingError>;

/// One node of a template tree.
///
/// The root of a column is a `Composite` named after the column; its
/// children are the literal and reference segments, in template order.
#[derive(Debug)]
pub enum TemplateNode {
    /// Concatenation of children, no separator.
    Composite { name: String, children: Vec<TemplateNode> },
    /// Field lookup followed by a filter chain.
    Leaf { source: String, filters: Vec<Box<dyn Filter>> },
    /// Fixed text. Takes neither children nor filters.
    Constant { value: String },
}

impl TemplateNode {
    pub fn composite(name: impl Into<String>) -> Self {
        TemplateNode::Composite {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn leaf(source: impl Into<String>) -> Self {
        TemplateNode::Leaf {
            source: source.into(),
            filters: Vec::new(),
        }
    }

    pub fn constant(value: impl Into<String>) -> Self {
        TemplateNode::Constant { value: value.into() }
    }

    pub fn add_child(&mut self, child: TemplateNode) -> BuildResult {
        match self {
            TemplateNode::Composite { children, .. } => {
                children.push(child);
                Ok(())
            }
            TemplateNode::Leaf { source, .. } => Err(OperationBuildingError::LeafChildren(source.clone())),
            TemplateNode::Constant { .. } => Err(OperationBuildingError::Constant("children")),
        }
    }

    pub fn set_children(&mut self, new_children: Vec<TemplateNode>) -> BuildResult {
        match self {
            TemplateNode::Composite { children, .. } => {
                *children = new_children;
                Ok(())
            }
            TemplateNode::Leaf { source, .. } => Err(OperationBuildingError::LeafChildren(source.clone())),
            TemplateNode::Constant { .. } => Err(OperationBuildingError::Constant("children")),
        }
    }

    pub fn add_filter(&mut self, filter: Box<dyn Filter>) -> BuildResult {
        match self {
            TemplateNode::Leaf { filters, .. } => {
                filters.push(filter);
                Ok(())
            }
            TemplateNode::Composite { .. } => Err(OperationBuildingError::CompositeFilters),
            TemplateNode::Constant { .. } => Err(OperationBuildingError::Constant("filters")),
        }
    }

    pub fn set_filters(&mut self, new_filters: Vec<Box<dyn Filter>>) -> BuildResult {
        match self {
            TemplateNode::Leaf { filters, .. } => {
                *filters = new_filters;
                Ok(())
            }
            TemplateNode::Composite { .. } => Err(OperationBuildingError::CompositeFilters),
            TemplateNode::Constant { .. } => Err(OperationBuildingError::Constant("filters")),
        }
    }
}

impl Operation for TemplateNode {
    fn name(&self) -> &str {
        match self {
            TemplateNode::Composite { name, .. } => name,
            _ => "",
        }
    }

    fn kind(&self) -> &str {
        match self {
            TemplateNode::Composite { .. } => "template",
            TemplateNode::Leaf { .. } => "field",
            TemplateNode::Constant { .. } => "constant",
        }
    }

    fn evaluate(&self, row: &Row) -> EvaluationResult<String> {
        match self {
            TemplateNode::Composite { name, children } => {
                if children.is_empty() {
                    return Err(EvaluationError::Unresolved(name.clone()));
                }
                let mut out = String::new();
                for child in children {
                    out.push_str(&child.evaluate(row)?);
                }
                Ok(out)
            }
            TemplateNode::Leaf { source, filters } => {
                let value = row.field(source)?.to_string();
                Ok(filters.iter().fold(value, |acc, f| f.apply(acc)))
            }
            TemplateNode::Constant { value } => Ok(value.clone()),
        }
    }

    fn children(&self) -> Vec<&dyn Operation> {
        match self {
            TemplateNode::Composite { children, .. } => children.iter().map(|c| c as &dyn Operation).collect(),
            _ => Vec::new(),
        }
    }

    fn summary(&self) -> String {
        match self {
            TemplateNode::Composite { children, .. } => format!("{} segment(s)", children.len()),
            TemplateNode::Leaf { source, filters } => {
                let mut parts = vec![source.clone()];
                parts.extend(filters.iter().map(|f| f.summary()));
                format!("{{{{ {} }}}}", parts.join(" | "))
            }
            TemplateNode::Constant { value } => format!("{:?}", value),
        }
    }
}
