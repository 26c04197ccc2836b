//! BuildLedger command-line tools
//!
//! Runs the form engine and the budget arithmetic against files on disk.
//!
//! ```bash
//! # Validate user form data
//! buildledger validate --data user.json --schema users.yaml
//!
//! # Validate only the email field and its group
//! buildledger validate --data user.json --schema users.yaml --config form.toml --field email
//!
//! # Budget and order totals
//! buildledger budget --file tower-a.yaml --format json
//! buildledger order --file po-7.yaml
//! ```

pub mod cli;
pub mod error;

pub use cli::{BuildLedgerCli, BuildLedgerCommands, ExitCode, OutputFormat};
pub use error::{CliError, Result};

/// Run the CLI and map failures to exit codes
pub fn run_cli(cli: BuildLedgerCli) -> ExitCode {
    match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}
