//! CLI module for BuildLedger
//!
//! Validates form data files against schemas and prints budget and purchase
//! order reports.

pub mod commands;
pub mod output;

pub use commands::{BuildLedgerCli, BuildLedgerCommands};
pub use output::{OutputFormat, Report, ReportSink};

use crate::error::CliError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful execution, data is valid
    Success = 0,
    /// Form data has field errors
    ValidationError = 1,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Schema could not be loaded or evaluated
    SchemaError = 5,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Determine exit code from validation result
    pub fn from_validation_result(has_errors: bool) -> Self {
        if has_errors {
            ExitCode::ValidationError
        } else {
            ExitCode::Success
        }
    }
}

/// Run the CLI with the given arguments and return the exit code
pub fn run(cli: BuildLedgerCli) -> Result<ExitCode, CliError> {
    let quiet = cli.quiet;
    match cli.command {
        BuildLedgerCommands::Validate {
            data,
            schema,
            config,
            fields,
            format,
        } => commands::execute_validate(data, schema, config, fields, ReportSink::new(format, quiet)),
        BuildLedgerCommands::Budget { file, format } => {
            commands::execute_budget(file, ReportSink::new(format, quiet))
        }
        BuildLedgerCommands::Order { file, format } => {
            commands::execute_order(file, ReportSink::new(format, quiet))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::ValidationError), 1);
        assert_eq!(i32::from(ExitCode::SchemaError), 5);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_exit_code_from_validation_result() {
        assert_eq!(ExitCode::from_validation_result(false), ExitCode::Success);
        assert_eq!(ExitCode::from_validation_result(true), ExitCode::ValidationError);
    }
}
