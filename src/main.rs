use clap::Parser;
use colored::Colorize;
use snackpack::commands::{self, Cli, Status};
use snackpack::sysexits;
use std::process;
use tracing_subscriber::EnvFilter;

/// Entry point for the snackpack CLI application.
/// Parses command-line arguments and dispatches to the appropriate command handler.
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    let Some(command) = cli.commands else {
        eprintln!("snackpack requires a command to execute. See 'snackpack --help' for usage.");
        process::exit(sysexits::EX_KEYWORD);
    };

    let code = match commands::run(command, cli.home) {
        Ok(Status::Clean) => 0,
        Ok(Status::ItemErrors) => sysexits::EX_ITEM_ERRORS,
        Err(e) => {
            eprintln!("{} {e:#}", "ERROR:".red().bold());
            e.downcast_ref::<snackpack::Error>()
                .map(snackpack::Error::exit_code)
                .unwrap_or(sysexits::EX_SOFTWARE)
        }
    };
    process::exit(code);
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
