//! BuildLedger CLI
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Form data has field errors
//! - 3: Invalid input or arguments
//! - 4: File not found or inaccessible
//! - 5: Schema error
//! - 10: Internal error

use buildledger_cli::{run_cli, BuildLedgerCli};
use clap::Parser;
use tracing::Level;

fn main() {
    let cli = BuildLedgerCli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = run_cli(cli);
    std::process::exit(exit_code.into());
}
