#![forbid(unsafe_code)]

mod backend;
mod config;
mod constants;
mod display;
mod error;
mod geometry;
#[cfg(unix)]
mod lock;
mod relocate;
#[cfg(test)]
mod testing;
mod window;
mod x11_utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use backend::DisplayRegistry;
use config::{parse_log_level, Settings};
use display::ContainmentPolicy;
use geometry::RoundingMode;
use relocate::{relocate_all_windows, RelocationReport};
use x11_utils::X11Desktop;

#[derive(Parser, Debug)]
#[command(name = "monitor-mover", version, about = "Move all windows onto one monitor, keeping their relative placement")]
struct Cli {
    /// trace, debug, info, warn or error (overrides LOG_LEVEL and the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Move every visible window onto the display at INDEX
    Move {
        /// Display index as printed by `list`
        index: usize,

        #[arg(long, value_enum)]
        rounding: Option<RoundingMode>,

        #[arg(long, value_enum)]
        containment: Option<ContainmentPolicy>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the attached displays with their indices
    List,
}

fn init_logging(cli: &Cli, settings: &Settings) -> Result<()> {
    // --log-level > LOG_LEVEL > config file
    let log_level = cli
        .log_level
        .as_deref()
        .and_then(parse_log_level)
        .or_else(|| {
            std::env::var(constants::env::LOG_LEVEL)
                .ok()
                .as_deref()
                .and_then(parse_log_level)
        })
        .unwrap_or_else(|| settings.log_level());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install tracing subscriber")?;
    Ok(())
}

fn print_report(report: &RelocationReport, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?
        );
        return Ok(());
    }

    println!(
        "{}: moved {}, skipped {}, failed {} ({} windows)",
        report.target,
        report.moved,
        report.skipped,
        report.failed,
        report.total()
    );
    for diag in &report.diagnostics {
        println!("  {} '{}': {}", diag.window, diag.title, diag.message);
    }
    Ok(())
}

fn list_displays(desktop: &X11Desktop) -> Result<()> {
    let displays = desktop.list_displays().context("Failed to list displays")?;
    for display in &displays {
        println!(
            "{}: {}{} {}",
            display.index,
            display.name,
            if display.primary { " (primary)" } else { "" },
            display.bounds
        );
    }
    Ok(())
}

fn run(cli: Cli, settings: Settings) -> Result<ExitCode> {
    let desktop = X11Desktop::connect()?;

    match cli.command {
        Command::List => {
            list_displays(&desktop)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Move {
            index,
            rounding,
            containment,
            json,
        } => {
            let mut options = settings.relocate_options();
            if let Some(rounding) = rounding {
                options.rounding = rounding;
            }
            if let Some(containment) = containment {
                options.containment = containment;
            }

            #[cfg(unix)]
            let _lock = {
                let lock = lock::PassLock::acquire()?;
                debug!(path = %lock.path().display(), "Holding relocation lock");
                lock
            };

            let report = relocate_all_windows(&desktop, &desktop, index, &options)
                .context(format!("Failed to move windows to display {}", index))?;
            print_report(&report, json)?;

            if report.has_failures() {
                warn!(failed = report.failed, "Some windows could not be moved");
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // No subscriber yet
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&cli, &settings) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }
    info!(settings = ?settings, "Loaded configuration");

    match run(cli, settings) {
        Ok(code) => code,
        Err(e) => {
            error!(error = ?e, "monitor-mover failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_move_with_overrides() {
        let cli = Cli::try_parse_from([
            "monitor-mover",
            "--log-level",
            "debug",
            "move",
            "1",
            "--rounding",
            "nearest",
            "--containment",
            "max-overlap",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Command::Move {
                index,
                rounding,
                containment,
                json,
            } => {
                assert_eq!(index, 1);
                assert_eq!(rounding, Some(RoundingMode::Nearest));
                assert_eq!(containment, Some(ContainmentPolicy::MaxOverlap));
                assert!(json);
            }
            Command::List => panic!("expected move"),
        }
    }

    #[test]
    fn test_negative_index_rejected() {
        assert!(Cli::try_parse_from(["monitor-mover", "move", "-1"]).is_err());
    }
}
