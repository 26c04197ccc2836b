//! Output formatting for the BuildLedger CLI
//!
//! Reports render as JSON, YAML, or a human-readable colored table.

use buildledger_budget::{ActivityRollup, BudgetRecord, BudgetTotals, CurrencyTotals, OrderLine, OrderTotals};
use buildledger_forms::ValidationOutcome;
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::error::{CliError, Result};

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// A serializable report with a table rendering
pub trait Report: Serialize {
    fn write_table(&self, out: &mut dyn Write) -> io::Result<()>;

    /// Render to `out` in the given format
    fn write(&self, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
        match format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(self)
                    .map_err(|e| CliError::SerializationError(e.to_string()))?;
                writeln!(out, "{}", json)?;
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(self)
                    .map_err(|e| CliError::SerializationError(e.to_string()))?;
                write!(out, "{}", yaml)?;
            }
            OutputFormat::Table => self.write_table(out)?,
        }
        out.flush()?;
        Ok(())
    }
}

/// Destination settings for command reports
#[derive(Debug, Clone, Copy)]
pub struct ReportSink {
    pub format: OutputFormat,
    /// `--quiet`: reports are dropped, errors still go to stderr
    pub quiet: bool,
}

impl ReportSink {
    pub fn new(format: Option<OutputFormat>, quiet: bool) -> Self {
        Self {
            format: format.unwrap_or_default(),
            quiet,
        }
    }

    /// Write `report` to `out` unless quiet
    pub fn emit_to(&self, report: &impl Report, out: &mut dyn Write) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        report.write(self.format, out)
    }

    /// Write `report` to stdout unless quiet
    pub fn emit(&self, report: &impl Report) -> Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.emit_to(report, &mut lock)
    }
}

fn header(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title.cyan().bold())?;
    writeln!(out, "{}", "=".repeat(60))
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

/// One field error in a validation report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldErrorOutput {
    pub field: String,
    pub message: String,
}

/// Result of the `validate` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub error_count: usize,
    pub errors: Vec<FieldErrorOutput>,
    /// Fields requested with `--field`; absent for a full pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    pub summary: String,
}

impl ValidationReport {
    pub fn from_outcome(outcome: &ValidationOutcome, fields: Option<Vec<String>>) -> Self {
        let errors: Vec<FieldErrorOutput> = outcome
            .errors
            .iter()
            .map(|(field, message)| FieldErrorOutput {
                field: field.clone(),
                message: message.clone(),
            })
            .collect();

        let summary = if outcome.is_valid {
            "Form data is valid".to_string()
        } else {
            format!("Form data has {} field error(s)", errors.len())
        };

        Self {
            valid: outcome.is_valid,
            error_count: errors.len(),
            errors,
            fields,
            summary,
        }
    }
}

impl Report for ValidationReport {
    fn write_table(&self, out: &mut dyn Write) -> io::Result<()> {
        header(out, "Validation Results")?;
        writeln!(out)?;

        let status = if self.valid { "+".green() } else { "x".red() };
        writeln!(out, "{} {}", status, self.summary)?;

        if let Some(fields) = &self.fields {
            writeln!(out, "  {} {}", "Fields:".dimmed(), fields.join(", "))?;
        }

        if !self.errors.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", "Errors:".cyan().bold())?;
            for error in &self.errors {
                writeln!(out, "  {} {:<20} {}", "x".red(), error.field, error.message.yellow())?;
            }
        }
        Ok(())
    }
}

/// Result of the `budget` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetReport {
    pub name: String,
    pub activity_count: usize,
    /// All categories converted at the budget's rate
    pub single: BudgetTotals,
    /// Each activity converted at its own rate
    pub by_activity: ActivityRollup,
}

impl BudgetReport {
    pub fn new(budget: &BudgetRecord, single: BudgetTotals, by_activity: ActivityRollup) -> Self {
        Self {
            name: budget.name.clone(),
            activity_count: budget.activities.len(),
            single,
            by_activity,
        }
    }
}

fn write_currency_rows(out: &mut dyn Write, label: &str, totals: &CurrencyTotals) -> io::Result<()> {
    writeln!(
        out,
        "  {:<10} {:>16} {:>16} {:>16}",
        label.dimmed(),
        money(totals.direct_cost),
        money(totals.admin_fee_amount),
        money(totals.grand_total).bold()
    )
}

impl Report for BudgetReport {
    fn write_table(&self, out: &mut dyn Write) -> io::Result<()> {
        header(out, &format!("Budget: {}", self.name))?;
        writeln!(out, "  {} {}", "Activities:".dimmed(), self.activity_count)?;
        writeln!(out)?;
        writeln!(out, "  {:<10} {:>16} {:>16} {:>16}", "", "Direct", "Admin fee", "Total")?;

        writeln!(
            out,
            "{}",
            format!("Single rate ({})", self.single.exchange_rate).cyan().bold()
        )?;
        write_currency_rows(out, "local", &self.single.local)?;
        write_currency_rows(out, "foreign", &self.single.foreign)?;

        writeln!(out, "{}", "Per-activity rates".cyan().bold())?;
        write_currency_rows(out, "local", &self.by_activity.local)?;
        write_currency_rows(out, "foreign", &self.by_activity.foreign)?;
        Ok(())
    }
}

/// One line of an order report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineOutput {
    pub material: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub tax_label: String,
}

impl OrderLineOutput {
    pub fn from_line(line: &OrderLine) -> Self {
        Self {
            material: line.material.clone(),
            quantity: line.quantity,
            unit_cost: line.unit_cost,
            subtotal: line.subtotal(),
            tax: line.tax(),
            tax_label: line.tax_label().to_string(),
        }
    }
}

/// Result of the `order` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub lines: Vec<OrderLineOutput>,
    pub totals: OrderTotals,
}

impl Report for OrderReport {
    fn write_table(&self, out: &mut dyn Write) -> io::Result<()> {
        let title = match &self.reference {
            Some(reference) => format!("Order {}", reference),
            None => "Order".to_string(),
        };
        header(out, &title)?;

        for line in &self.lines {
            writeln!(
                out,
                "  {:<20} {:>8} x {:>10} = {:>12}  tax {:>10} ({})",
                line.material,
                line.quantity,
                money(line.unit_cost),
                money(line.subtotal),
                money(line.tax),
                line.tax_label.dimmed()
            )?;
        }

        writeln!(out)?;
        writeln!(out, "  {:<12} {:>14}", "Subtotal:".dimmed(), money(self.totals.subtotal))?;
        writeln!(out, "  {:<12} {:>14}", "Taxes:".dimmed(), money(self.totals.total_taxes))?;
        writeln!(out, "  {:<12} {:>14}", "Total:".bold(), money(self.totals.total).green().bold())?;
        Ok(())
    }
}
