//! Command-line interface definition for snackpack.
//!
//! This module defines the CLI, its subcommands and arguments, and the glue
//! that wires config loading, destination resolution, syncing and coverage
//! reporting to terminal output.

use crate::config::{self, Config};
use crate::coverage::{self, UsageBackend};
use crate::destination::{self, SystemMounts};
use crate::mirror::MirrorBackend;
use crate::path_util;
use crate::printer::{Printer, Style};
use crate::prompt::StdinPrompter;
use crate::sync::{self, Mode, SyncContext, SyncReport};
use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line interface definition for snackpack.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub commands: Option<Commands>,
    /// Home directory to back up. Defaults to the current user's.
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,
    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Supported snackpack commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync every chunk of a config to its destination.
    Sync(SyncArgs),
    /// Show which entries of the home directory a config covers, and their size.
    Map {
        #[command(flatten)]
        config: ConfigArg,
        /// How to measure disk usage.
        #[arg(long, value_enum, default_value_t)]
        usage: UsageBackend,
    },
    /// Print a config after parsing, with source lists expanded.
    Examine {
        #[command(flatten)]
        config: ConfigArg,
    },
    /// List the configs in the config directory.
    Configs,
}

#[derive(Args, Debug)]
pub struct ConfigArg {
    /// Config file to use. Defaults to the first one in the config directory.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub config: ConfigArg,
    /// Destination root to use instead of searching the configured mounts.
    #[arg(short, long, value_name = "DIR")]
    pub dest_root: Option<PathBuf>,
    /// Ask before every item.
    #[arg(short, long)]
    pub prompt_pause: bool,
    /// Show what would be done without touching anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
    /// How to mirror directories.
    #[arg(long, value_enum, default_value_t)]
    pub mirror: MirrorBackend,
}

/// How a command that did not fail outright went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Clean,
    /// Finished, but some items could not be transferred.
    ItemErrors,
}

/// Runs one subcommand.
pub fn run(commands: Commands, home: Option<PathBuf>) -> Result<Status> {
    let home = path_util::home_dir(home)?;
    let mut printer = Printer::stdout();
    match commands {
        Commands::Sync(args) => sync(args, &home, &mut printer),
        Commands::Map { config, usage } => {
            map(config.config, usage, &home, &mut printer)?;
            Ok(Status::Clean)
        }
        Commands::Examine { config } => {
            examine(config.config, &home, &mut printer)?;
            Ok(Status::Clean)
        }
        Commands::Configs => {
            list_configs(&mut printer)?;
            Ok(Status::Clean)
        }
    }
}

/// Resolves which config file to use: `explicit`, or the default one.
fn config_file(explicit: Option<PathBuf>, home: &Path) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path_util::expand_home(&path, home)),
        None => {
            let dir = config::config_dir()?;
            info!(dir = %dir.display(), "looking for a default config");
            Ok(config::default_config_file(&dir)?)
        }
    }
}

fn load(explicit: Option<PathBuf>, home: &Path) -> Result<(PathBuf, Config)> {
    let path = config_file(explicit, home)?;
    let config = Config::load(&path)
        .with_context(|| format!("while loading {}", path.display()))?;
    Ok((path, config))
}

/// Syncs all chunks of the chosen config.
pub fn sync<W: Write>(args: SyncArgs, home: &Path, printer: &mut Printer<W>) -> Result<Status> {
    printer.header(Style::Plain, "Start");
    let mode = if args.dry_run {
        Mode::DryRun
    } else {
        Mode::Execute
    };

    printer.header(Style::Plain, "Loading the config");
    let (path, config) = load(args.config.config, home)?;
    printer.line(Style::Blue, format!("Using {}", path.display()));

    printer.header(Style::Plain, "Finding the destination");
    let override_root = args
        .dest_root
        .map(|root| path_util::expand_home(&root, home));
    let mut prompter = StdinPrompter;
    let dest_root = destination::resolve(
        &config.destinations,
        override_root.as_deref(),
        mode,
        &SystemMounts,
        &mut prompter,
        printer,
    )?;
    printer.line(Style::Blue, format!("Destination {}", dest_root.display()));

    let ctx = SyncContext {
        home: home.to_path_buf(),
        dest_root,
        mode,
        interactive: args.prompt_pause,
    };
    let mirror = args.mirror.build();
    let report = sync::execute(&config.chunks, &ctx, mirror.as_ref(), &mut prompter, printer)?;

    let status = report_errors(&report, printer);
    printer.header(Style::Plain, "End");
    Ok(status)
}

fn report_errors<W: Write>(report: &SyncReport, printer: &mut Printer<W>) -> Status {
    if !report.has_errors() {
        return Status::Clean;
    }
    printer.header(Style::RedBold, "Errors");
    printer.line(Style::Red, "The following errors were encountered:");
    for record in &report.errors {
        printer.line(Style::Red, record.to_string());
    }
    Status::ItemErrors
}

/// Prints the coverage report for the chosen config.
pub fn map<W: Write>(
    config: Option<PathBuf>,
    usage: UsageBackend,
    home: &Path,
    printer: &mut Printer<W>,
) -> Result<()> {
    let (_, config) = load(config, home)?;
    let report = coverage::analyze(home, &config.chunks, usage.build().as_ref())
        .with_context(|| format!("while reading {}", home.display()))?;

    printer.header(Style::Plain, "Map");
    printer.line(Style::Blue, "Skipping paths");
    for path in &report.skipped {
        printer.line(Style::Red, path.display().to_string());
    }
    printer.blank();

    printer.line(Style::Blue, "Syncing paths");
    for entry in &report.covered {
        printer.line(
            Style::Plain,
            format!(
                "{:>10}K  {:<5} {}",
                entry.size_kb,
                entry.kind.to_string(),
                entry.relative_path.display()
            ),
        );
    }
    for path in &report.malformed {
        printer.line(Style::RedBold, format!("ERROR? {}", path.display()));
    }
    printer.blank();
    printer.line(Style::Green, format!("Total {}", report.total()));
    Ok(())
}

/// Prints the parsed config.
pub fn examine<W: Write>(
    config: Option<PathBuf>,
    home: &Path,
    printer: &mut Printer<W>,
) -> Result<()> {
    let (path, config) = load(config, home)?;
    printer.rule(Style::Plain, &path.display().to_string());
    let text = toml::to_string_pretty(&config).context("while rendering the config")?;
    printer.line(Style::Plain, text.trim_end());
    Ok(())
}

/// Lists every config in the config directory with its title and first mount.
pub fn list_configs<W: Write>(printer: &mut Printer<W>) -> Result<()> {
    let dir = config::config_dir()?;
    for path in config::list_config_files(&dir)? {
        printer.rule(Style::Plain, "");
        printer.line(Style::Blue, path.display().to_string());
        match Config::load(&path) {
            Ok(config) => {
                printer.line(
                    Style::Plain,
                    format!("title: {}", config.title.as_deref().unwrap_or("")),
                );
                let mount = config
                    .first_mount()
                    .map(|m| m.display().to_string())
                    .unwrap_or_default();
                printer.line(Style::Plain, format!("mount: {mount}"));
            }
            Err(e) => printer.line(Style::Red, format!("unreadable: {e}")),
        }
    }
    printer.rule(Style::Plain, "");
    Ok(())
}
