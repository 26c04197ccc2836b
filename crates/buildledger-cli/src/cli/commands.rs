//! CLI command definitions for BuildLedger
//!
//! Validate form data against a schema and print budget or order totals.

use buildledger_budget::{order_totals, BudgetRecord, OrderLine};
use buildledger_forms::{FormConfig, FormData, FormError, FormHandle, FormSchema};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::output::{BudgetReport, OrderLineOutput, OrderReport, OutputFormat, ReportSink, ValidationReport};
use super::ExitCode;
use crate::error::{CliError, Result};

/// BuildLedger CLI
///
/// Validate admin form data and compute budget and order totals.
#[derive(Parser, Debug)]
#[command(name = "buildledger")]
#[command(about = "BuildLedger - form validation and budget reports", long_about = None)]
#[command(version)]
pub struct BuildLedgerCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print no report; only errors reach the terminal
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: BuildLedgerCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum BuildLedgerCommands {
    /// Validate form data against a schema
    ///
    /// Runs a full validation pass, or only the given fields (plus their
    /// related fields) when `--field` is used.
    Validate {
        /// Path to the form data file
        #[arg(short, long)]
        data: PathBuf,

        /// Path to the schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// Path to a TOML form config (triggers and field groups)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Validate only these fields
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: Option<OutputFormat>,
    },

    /// Print single-rate and per-activity totals of a budget
    Budget {
        /// Path to the budget file
        #[arg(short, long)]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: Option<OutputFormat>,
    },

    /// Print subtotal, taxes and total of a purchase order
    Order {
        /// Path to the order file
        #[arg(short, long)]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: Option<OutputFormat>,
    },
}

/// Purchase order document as read from disk
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDocument {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
}

/// Execute the validate command
pub fn execute_validate(
    data: PathBuf,
    schema: PathBuf,
    config: Option<PathBuf>,
    fields: Vec<String>,
    sink: ReportSink,
) -> Result<ExitCode> {
    let form_data: FormData = parse_document(&data, &read_file(&data, "data")?)?;
    let form_schema = load_schema(&schema)?;

    let form_config = match &config {
        Some(path) => FormConfig::from_file(path)?,
        None => FormConfig::default(),
    }
    .with_env_overrides()?;

    for field in &fields {
        if !form_schema.declares(field) {
            return Err(CliError::invalid_input(format!("Field '{}' is not declared in the schema", field)));
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::InternalError(format!("Failed to start runtime: {}", e)))?;

    let outcome = runtime.block_on(async {
        let form = FormHandle::builder(form_schema)
            .config(form_config)
            .initial_data(form_data)
            .build();

        if fields.is_empty() {
            form.validate_all(None).await
        } else {
            form.validate_fields(&fields).await
        }
    })?;

    info!(valid = outcome.is_valid, errors = outcome.errors.len(), "validation finished");

    let selected = if fields.is_empty() { None } else { Some(fields) };
    sink.emit(&ValidationReport::from_outcome(&outcome, selected))?;

    Ok(ExitCode::from_validation_result(!outcome.is_valid))
}

/// Execute the budget command
pub fn execute_budget(file: PathBuf, sink: ReportSink) -> Result<ExitCode> {
    let budget: BudgetRecord = parse_document(&file, &read_file(&file, "budget")?)?;

    let single = budget.single_view()?;
    let by_activity = budget.activity_view()?;
    debug!(budget = %budget.name, activities = budget.activities.len(), "budget aggregated");

    sink.emit(&BudgetReport::new(&budget, single, by_activity))?;
    Ok(ExitCode::Success)
}

/// Execute the order command
pub fn execute_order(file: PathBuf, sink: ReportSink) -> Result<ExitCode> {
    let order: OrderDocument = parse_document(&file, &read_file(&file, "order")?)?;

    let report = OrderReport {
        reference: order.reference.clone(),
        lines: order.lines.iter().map(OrderLineOutput::from_line).collect(),
        totals: order_totals(&order.lines),
    };
    sink.emit(&report)?;
    Ok(ExitCode::Success)
}

fn read_file(path: &Path, kind: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        CliError::file_error(format!("Failed to read {} file '{}': {}", kind, path.display(), e))
    })
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Parse a document based on its file extension
pub fn parse_document<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    match extension(path).as_str() {
        "json" => Ok(serde_json::from_str(content)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(content)?),
        "toml" => Ok(toml::from_str(content)?),
        other => Err(CliError::invalid_input(format!(
            "Unsupported file format: {}. Supported formats: json, yaml, yml, toml",
            other
        ))),
    }
}

/// Load a schema; an unreadable file is a file error, anything else a schema error
fn load_schema(path: &Path) -> Result<FormSchema> {
    FormSchema::from_file(path).map_err(|e| match e {
        FormError::File { .. } => CliError::file_error(e.to_string()),
        other => CliError::schema_error(other.to_string()),
    })
}
