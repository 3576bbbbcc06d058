//! High-level pipeline: configuration + input files -> rendered output.
//!
//! # Example
//!
//! ```rust,no_run
//! use reorg::config::Configuration;
//! use reorg::transform::pipeline::{transform_files, write_output, TransformOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Configuration::from_file("columns.yaml")?;
//! let options = TransformOptions::new(vec!["export.csv".into()]);
//! let output = transform_files(&config, &options)?;
//! write_output(&output.rendered, Some("reorganised.csv".as_ref()))?;
//! # Ok(())
//! # }
//! ```

use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::executor::{execute, ColumnPlan, TransformResult};
use crate::config::{check_delimiter, Configuration};
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_info, log_info_indent, log_success};
use crate::models::Row;
use crate::parser::parse_file;

/// Output serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}' (expected csv or json)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        })
    }
}

/// Options for the transformation pipeline
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Input files, processed in order
    pub inputs: Vec<PathBuf>,

    /// Input delimiter; overrides the configuration header
    pub delimiter: Option<char>,

    /// Output delimiter; overrides the configuration header
    pub output_delimiter: Option<char>,

    pub format: OutputFormat,
}

impl TransformOptions {
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }
}

/// Input file information
#[derive(Debug, Clone)]
pub struct InputInfo {
    pub path: PathBuf,
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: TransformResult,
    pub inputs: Vec<InputInfo>,
    pub format: OutputFormat,
    /// Serialized output, ready to write.
    pub rendered: String,
}

/// Run the whole pipeline over `options.inputs`.
///
/// Nothing is written here; a failure at any stage leaves no output behind.
pub fn transform_files(config: &Configuration, options: &TransformOptions) -> PipelineResult<PipelineOutput> {
    let input_delimiter = options.delimiter.or(config.header.delimiter);
    if let Some(d) = input_delimiter {
        check_delimiter(d)?;
    }
    let output_delimiter = check_delimiter(
        options
            .output_delimiter
            .or(config.header.output_delimiter)
            .unwrap_or(','),
    )?;

    let plan = compile(config)?;

    let mut rows: Vec<Row> = Vec::new();
    let mut inputs = Vec::with_capacity(options.inputs.len());
    for path in &options.inputs {
        log_info(format!("📖 Reading {}", path.display()));
        let parsed = parse_file(path, input_delimiter)?;
        log_info_indent(format!("Encoding: {}", parsed.encoding), 1);
        log_info_indent(
            format!(
                "Delimiter: '{}'{}",
                format_delimiter(parsed.delimiter),
                if input_delimiter.is_none() { " (auto-detected)" } else { "" }
            ),
            1,
        );
        log_info_indent(format!("Columns: {}", parsed.headers.join(", ")), 1);
        log_success(format!("Read {} rows", parsed.rows.len()));

        inputs.push(InputInfo {
            path: path.clone(),
            encoding: parsed.encoding,
            delimiter: parsed.delimiter,
            headers: parsed.headers,
            row_count: parsed.rows.len(),
        });
        rows.extend(parsed.rows);
    }

    log_info("⚙️  Evaluating rows...");
    let table = execute(&rows, &plan)?;
    log_success(table.summary());

    let rendered = match options.format {
        OutputFormat::Csv => render_csv(&table, output_delimiter)?,
        OutputFormat::Json => render_json(&table)?,
    };

    Ok(PipelineOutput {
        table,
        inputs,
        format: options.format,
        rendered,
    })
}

/// Compile and evaluate already-parsed rows.
pub fn transform_rows(config: &Configuration, rows: &[Row]) -> PipelineResult<TransformResult> {
    let plan = compile(config)?;
    execute(rows, &plan)
}

/// Build the engine selected by `config` and compile its columns.
pub fn compile(config: &Configuration) -> PipelineResult<ColumnPlan> {
    let kind = config.engine_kind()?;
    log_info(format!("🧩 Engine: {}", kind));
    if !config.header.description.is_empty() {
        log_info_indent(config.header.description.clone(), 1);
    }
    let plan = ColumnPlan::compile(config)?;
    log_success(format!("Compiled {} column(s)", plan.len()));
    Ok(plan)
}

/// Header row then one record per row.
pub fn render_csv(table: &TransformResult, delimiter: u8) -> PipelineResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for record in &table.records {
        writer.write_record(record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::Output(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|e| PipelineError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Array of objects keyed by column name, keys in column order.
pub fn render_json(table: &TransformResult) -> PipelineResult<String> {
    let objects: Vec<Map<String, Value>> = table
        .records
        .iter()
        .map(|record| {
            table
                .headers
                .iter()
                .cloned()
                .zip(record.iter().cloned().map(Value::String))
                .collect()
        })
        .collect();
    Ok(serde_json::to_string_pretty(&objects)?)
}

/// Write to `path`, or to stdout when no path is given.
pub fn write_output(content: &str, path: Option<&Path>) -> PipelineResult<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            log_success(format!("💾 Output written to: {}", p.display()));
        }
        None => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TransformResult {
        TransformResult {
            headers: vec!["Full".into(), "City".into()],
            records: vec![
                vec!["Ada Lovelace".into(), "Turin".into()],
                vec!["Turing, Alan".into(), "Wilmslow".into()],
            ],
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!(" json ".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_csv_quotes_embedded_delimiters() {
        let out = render_csv(&table(), b',').unwrap();
        assert_eq!(out, "Full,City\nAda Lovelace,Turin\n\"Turing, Alan\",Wilmslow\n");
    }

    #[test]
    fn test_render_csv_custom_delimiter() {
        let out = render_csv(&table(), b';').unwrap();
        assert!(out.starts_with("Full;City\n"));
        assert!(out.contains("Turing, Alan;Wilmslow"));
    }

    #[test]
    fn test_render_json_keeps_column_order() {
        let out = render_json(&table()).unwrap();
        let parsed: Vec<Map<String, Value>> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 2);
        let keys: Vec<_> = parsed[0].keys().cloned().collect();
        assert_eq!(keys, vec!["Full", "City"]);
        assert_eq!(parsed[1]["City"], "Wilmslow");
    }

    #[test]
    fn test_transform_rows() {
        let config = Configuration::from_yaml(
            "header:\n  engine: template\ncolumns:\n  - column: Name\n    template: \"{{ name | upper }}\"\n",
        )
        .unwrap();
        let rows: Vec<Row> = vec![[("name", "ada")].into_iter().collect()];
        let result = transform_rows(&config, &rows).unwrap();
        assert_eq!(result.records, vec![vec!["ADA"]]);
    }
}
