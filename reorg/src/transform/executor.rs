//! Column plan executor.
//!
//! Compiles a configuration into one operation per output column and
//! evaluates every row against it.

use crate::config::{ColumnSpec, Configuration};
use crate::engine::{build_engine, Engine};
use crate::error::{ImportResult, PipelineError, PipelineResult};
use crate::logs::log_info_indent;
use crate::models::Row;
use crate::operation::Operation;

/// Compiled output columns, in declaration order.
#[derive(Debug)]
pub struct ColumnPlan {
    columns: Vec<Box<dyn Operation>>,
}

impl ColumnPlan {
    /// Build the engine selected by `config` and compile every column.
    pub fn compile(config: &Configuration) -> PipelineResult<Self> {
        let engine = build_engine(config.engine_kind()?)?;
        Ok(Self::compile_with(engine.as_ref(), &config.columns)?)
    }

    /// Compile `specs` with `engine`. Stops at the first bad column.
    pub fn compile_with(engine: &dyn Engine, specs: &[ColumnSpec]) -> ImportResult<Self> {
        let mut columns = Vec::with_capacity(specs.len());
        for spec in specs {
            let operation = engine.parse_column(spec)?;
            log_info_indent(format!("{} <- {}", operation.name(), operation.summary()), 1);
            columns.push(operation);
        }
        Ok(Self { columns })
    }

    /// Output header row.
    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn columns(&self) -> &[Box<dyn Operation>] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Evaluate every column for one row. `row_number` is 1-based and only
    /// used in errors.
    pub fn evaluate_row(&self, row_number: usize, row: &Row) -> PipelineResult<Vec<String>> {
        self.columns
            .iter()
            .map(|column| {
                column.evaluate(row).map_err(|source| PipelineError::Evaluation {
                    row: row_number,
                    column: column.name().to_string(),
                    source,
                })
            })
            .collect()
    }
}

/// Evaluated output table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformResult {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl TransformResult {
    pub fn summary(&self) -> String {
        format!("Transformed: {} records, {} columns", self.records.len(), self.headers.len())
    }
}

/// Evaluate every row. The first failing row aborts the run.
pub fn execute(rows: &[Row], plan: &ColumnPlan) -> PipelineResult<TransformResult> {
    let records = rows
        .iter()
        .enumerate()
        .map(|(i, row)| plan.evaluate_row(i + 1, row))
        .collect::<PipelineResult<Vec<_>>>()?;

    Ok(TransformResult {
        headers: plan.headers(),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{StructuredEngine, TemplateEngine};
    use crate::error::EvaluationError;
    use serde_json::{json, Value};

    fn specs(value: Value) -> Vec<ColumnSpec> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn rows() -> Vec<Row> {
        vec![
            [("First", "Ada"), ("Last", "Lovelace"), ("town", "Turin")].into_iter().collect(),
            [("First", "Alan"), ("Last", "Turing"), ("town", "Wilmslow")].into_iter().collect(),
        ]
    }

    #[test]
    fn test_structured_plan() {
        let engine = StructuredEngine::new().unwrap();
        let plan = ColumnPlan::compile_with(
            &engine,
            &specs(json!([
                {"column": "City", "source": "town"},
                {"column": "Full", "operation": {"type": "concat", "values": ["First", " ", "Last"]}},
            ])),
        )
        .unwrap();

        let result = execute(&rows(), &plan).unwrap();
        assert_eq!(result.headers, vec!["City", "Full"]);
        assert_eq!(result.records[0], vec!["Turin", "Ada Lovelace"]);
        assert_eq!(result.records[1], vec!["Wilmslow", "Alan Turing"]);
    }

    #[test]
    fn test_template_plan() {
        let engine = TemplateEngine::new().unwrap();
        let plan = ColumnPlan::compile_with(
            &engine,
            &specs(json!([{"column": "Who", "template": "{{ Last | upper }}, {{ First }}"}])),
        )
        .unwrap();

        let result = execute(&rows(), &plan).unwrap();
        assert_eq!(result.records, vec![vec!["LOVELACE, Ada"], vec!["TURING, Alan"]]);
    }

    #[test]
    fn test_failing_row_reports_position() {
        let engine = StructuredEngine::new().unwrap();
        let plan =
            ColumnPlan::compile_with(&engine, &specs(json!([{"column": "Zip", "source": "zip"}]))).unwrap();

        let err = execute(&rows(), &plan).unwrap_err();
        match err {
            PipelineError::Evaluation { row, column, source } => {
                assert_eq!(row, 1);
                assert_eq!(column, "Zip");
                assert_eq!(source, EvaluationError::MissingColumn("zip".into()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_compile_stops_at_bad_column() {
        let engine = StructuredEngine::new().unwrap();
        let result = ColumnPlan::compile_with(
            &engine,
            &specs(json!([{"column": "A", "source": "a"}, {"column": "X", "nonsense": 1}])),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_no_rows_gives_headers_only() {
        let engine = StructuredEngine::new().unwrap();
        let plan = ColumnPlan::compile_with(&engine, &specs(json!([{"column": "A", "constant": "x"}]))).unwrap();
        let result = execute(&[], &plan).unwrap();
        assert_eq!(result.headers, vec!["A"]);
        assert!(result.records.is_empty());
    }
}
