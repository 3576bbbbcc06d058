//! Transformation module.
//!
//! - Executor: compile column specifications and evaluate rows
//! - Pipeline: read inputs, run the executor, render output

pub mod executor;
pub mod pipeline;

pub use executor::{execute, ColumnPlan, TransformResult};
pub use pipeline::{
    compile, render_csv, render_json, transform_files, transform_rows, write_output, InputInfo, OutputFormat,
    PipelineOutput, TransformOptions,
};
