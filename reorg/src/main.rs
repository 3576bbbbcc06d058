//! Reorg CLI - reorganise CSV columns from YAML rules
//!
//! # Main Commands
//!
//! ```bash
//! reorg transform -c rules.yaml -i export.csv       # Reorganise to stdout (CSV)
//! reorg transform -c rules.yaml -i a.csv -i b.csv -o out.json --format json
//! ```
//!
//! # Inspection Commands
//!
//! ```bash
//! reorg check -c rules.yaml        # Compile every column, print headers
//! reorg explain -c rules.yaml      # Print each column's operation tree
//! reorg operations                 # List operations, shortcuts and filters
//! reorg example-config             # Print an example configuration
//! reorg parse export.csv           # Parse a CSV file and output JSON
//! ```

use clap::{Parser, Subcommand};
use reorg::logs::{log_error, log_info, log_success, set_level, LogLevel};
use reorg::{
    catalog_description, parse_file, render_tree, transform_files, transform::compile, write_output,
    Configuration, OutputFormat, TransformOptions,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "reorg")]
#[command(about = "Reorganise CSV datasets into rule-defined columns", long_about = None)]
struct Cli {
    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print debug details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: CSV files + YAML rules -> reorganised dataset
    Transform {
        /// YAML configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Input CSV file (repeat for several, processed in order)
        #[arg(short, long = "input", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: csv or json
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,

        /// Input delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output delimiter for CSV output
        #[arg(long)]
        output_delimiter: Option<char>,
    },

    /// Compile every column without reading data
    Check {
        /// YAML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the operation tree of every column
    Explain {
        /// YAML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Show available operations, shortcuts and filters
    Operations,

    /// Show an example configuration
    ExampleConfig,

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    configure_logging(cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Transform {
            config,
            inputs,
            output,
            format,
            delimiter,
            output_delimiter,
        } => cmd_transform(
            &config,
            TransformOptions {
                inputs,
                delimiter,
                output_delimiter,
                format,
            },
            output.as_deref(),
        ),

        Commands::Check { config } => cmd_check(&config),

        Commands::Explain { config } => cmd_explain(&config),

        Commands::Operations => cmd_operations(),

        Commands::ExampleConfig => {
            print!("{}", reorg::config::example_configuration());
            Ok(())
        }

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn configure_logging(quiet: bool, verbose: bool) {
    let from_env = std::env::var("REORG_LOG").ok().and_then(|v| LogLevel::parse(&v));
    let level = if quiet {
        LogLevel::Error
    } else if verbose {
        LogLevel::Debug
    } else {
        from_env.unwrap_or(LogLevel::Info)
    };
    set_level(level);
}

fn cmd_transform(
    config_path: &Path,
    options: TransformOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("📄 Configuration: {}", config_path.display()));
    let config = Configuration::from_file(config_path)?;

    let result = transform_files(&config, &options)?;
    write_output(&result.rendered, output)?;

    log_success("✨ Done!");
    Ok(())
}

fn cmd_check(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Configuration::from_file(config_path)?;
    let plan = compile(&config)?;

    println!("{}", plan.headers().join(", "));
    Ok(())
}

fn cmd_explain(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Configuration::from_file(config_path)?;
    let plan = compile(&config)?;

    for column in plan.columns() {
        for line in render_tree(column.as_ref()) {
            println!("{}", line);
        }
        for param in column.parameters() {
            let marker = if param.required { "required" } else { "optional" };
            println!("    · {} ({}, {})", param.property, param.kind, marker);
        }
    }
    Ok(())
}

fn cmd_operations() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", catalog_description()?);
    Ok(())
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("📄 Parsing CSV: {}", input.display()));

    let result = parse_file(input, delimiter)?;
    log_info(format!("   Encoding: {}", result.encoding));
    log_info(format!("   Columns: {}", result.headers.join(", ")));
    log_success(format!("Parsed {} rows", result.rows.len()));

    let records: Vec<Map<String, Value>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .headers
                .iter()
                .map(|h| (h.clone(), Value::String(row.get(h).unwrap_or_default().to_string())))
                .collect()
        })
        .collect();
    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)?;

    Ok(())
}
