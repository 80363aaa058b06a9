//! habitgrid CLI - command-line front end for the habit tracker engine
//!
//! Commands:
//! - view: Render a metric's calendar heatmap and summary
//! - summary: Print min/avg/max and streaks for a metric
//! - add: Record today's values for every metric
//! - sync: Reconcile the store with the configuration
//! - metrics: List configured metrics

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use habitgrid::calendar::CalendarGrid;
use habitgrid::color::Rgb;
use habitgrid::config::DEFAULT_CONFIG_FILE;
use habitgrid::store::DEFAULT_STORE_FILE;
use habitgrid::types::{SubmitOutcome, Summary};
use habitgrid::{EngineError, HabitTracker, HABITGRID_VERSION};

/// habitgrid - Track daily habits and render them as calendar heatmaps
#[derive(Parser)]
#[command(name = "habitgrid")]
#[command(version = HABITGRID_VERSION)]
#[command(about = "Track daily habits as calendar heatmaps", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Store file
    #[arg(long, global = true, default_value = DEFAULT_STORE_FILE)]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a metric's calendar heatmap and summary
    View {
        /// Metric number (1-based, configuration order)
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
        metric: u16,

        /// Any day of the year (or month) to show, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Show only the month containing the date
        #[arg(long)]
        month: bool,

        /// Output the grid and summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print min/avg/max and streaks for a metric
    Summary {
        /// Metric number (1-based, configuration order)
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
        metric: u16,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record today's values, one per metric in configuration order
    Add {
        /// Raw values
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Reconcile the store with the configuration and save it
    Sync {
        /// Output the reconciliation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured metrics
    Metrics,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), HabitCliError> {
    let mut tracker = HabitTracker::open(&cli.config, &cli.store)?;

    match cli.command {
        Commands::View {
            metric,
            date,
            month,
            json,
        } => cmd_view(&tracker, metric as usize - 1, date, month, json),

        Commands::Summary { metric, json } => cmd_summary(&tracker, metric as usize - 1, json),

        Commands::Add { values } => cmd_add(&mut tracker, &values),

        Commands::Sync { json } => cmd_sync(&tracker, json),

        Commands::Metrics => {
            for (i, definition) in tracker.definitions().iter().enumerate() {
                let entries = tracker.store().series[i].len();
                println!(
                    "{:>2}. {} [{}] {} entries",
                    i + 1,
                    definition.name,
                    definition.rule,
                    entries
                );
            }
            Ok(())
        }
    }
}

fn cmd_view(
    tracker: &HabitTracker,
    index: usize,
    date: Option<NaiveDate>,
    month: bool,
    json: bool,
) -> Result<(), HabitCliError> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let grid = if month {
        tracker.render_month(index, date)?
    } else {
        tracker.render_grid(index, date)?
    };
    let summary = tracker.summary(index)?;

    if json {
        let report = ViewReport {
            metric: tracker.metric_names()[index].clone(),
            first_day: grid.first_day(),
            last_day: grid.last_day(),
            grid: grid.colors(),
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", tracker.metric_names()[index]);
    println!();
    print!("{}", render_grid_text(&grid, atty::is(atty::Stream::Stdout))?);
    println!();
    print_summary(summary.as_ref());
    Ok(())
}

fn cmd_summary(tracker: &HabitTracker, index: usize, json: bool) -> Result<(), HabitCliError> {
    let summary = tracker.summary(index)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(summary.as_ref());
    }
    Ok(())
}

fn cmd_add(tracker: &mut HabitTracker, values: &[String]) -> Result<(), HabitCliError> {
    let now = Local::now().fixed_offset();
    match tracker.submit_entry(values, now)? {
        SubmitOutcome::Accepted => {
            println!("Saved entry for {}", now.date_naive());
            Ok(())
        }
        SubmitOutcome::Rejected {
            first_invalid_index,
        } => {
            let definition = &tracker.definitions()[first_invalid_index];
            Err(HabitCliError::InvalidValue {
                metric: definition.name.clone(),
                rule: definition.rule.to_string(),
                value: values[first_invalid_index].clone(),
            })
        }
    }
}

fn cmd_sync(tracker: &HabitTracker, json: bool) -> Result<(), HabitCliError> {
    let report = tracker.reconcile_report();
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if !report.changed {
        println!("Store already matches the configuration");
        return Ok(());
    }
    for name in &report.added {
        println!("  + {name}");
    }
    for name in &report.dropped {
        println!("  - {name}");
    }
    if report.reordered {
        println!("  metrics reordered");
    }
    if report.dropped_entries > 0 {
        println!("{} entries discarded", report.dropped_entries);
    }
    Ok(())
}

// Helper functions

fn render_grid_text(grid: &CalendarGrid, color: bool) -> Result<String, HabitCliError> {
    let mut out = String::new();
    for row in grid.rows() {
        let mut cells = Vec::with_capacity(row.len());
        for cell in row {
            if color {
                let (r, g, b) = Rgb::from_hex(&cell.color)?.to_bytes();
                cells.push(format!("\x1b[38;2;{r};{g};{b}m■\x1b[0m"));
            } else {
                cells.push(cell.color.clone());
            }
        }
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    Ok(out)
}

fn print_summary(summary: Option<&Summary>) {
    match summary {
        Some(s) => {
            println!("Minimum: {} || Average: {} || Maximum: {}", s.min, s.avg, s.max);
            println!(
                "Current Streak: {} || Longest Streak: {}",
                s.current_streak, s.longest_streak
            );
        }
        None => println!("No entries yet!"),
    }
}

// Error types

#[derive(Debug)]
enum HabitCliError {
    Engine(EngineError),
    Json(serde_json::Error),
    InvalidValue {
        metric: String,
        rule: String,
        value: String,
    },
}

impl From<EngineError> for HabitCliError {
    fn from(e: EngineError) -> Self {
        HabitCliError::Engine(e)
    }
}

impl From<serde_json::Error> for HabitCliError {
    fn from(e: serde_json::Error) -> Self {
        HabitCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HabitCliError> for CliError {
    fn from(e: HabitCliError) -> Self {
        match e {
            HabitCliError::Engine(e) if e.is_fatal() => CliError {
                code: "STORE_CORRUPT".to_string(),
                message: e.to_string(),
                hint: Some("Restore the store file from a backup".to_string()),
            },
            HabitCliError::Engine(EngineError::UnknownMetric(index)) => CliError {
                code: "UNKNOWN_METRIC".to_string(),
                message: format!("No metric number {}", index + 1),
                hint: Some("Run 'habitgrid metrics' to list metrics".to_string()),
            },
            HabitCliError::Engine(e @ EngineError::ValueCountMismatch { .. }) => CliError {
                code: "VALUE_COUNT".to_string(),
                message: e.to_string(),
                hint: Some("Pass one value per configured metric".to_string()),
            },
            HabitCliError::Engine(e @ EngineError::Io(_)) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HabitCliError::Engine(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the configuration file".to_string()),
            },
            HabitCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            HabitCliError::InvalidValue {
                metric,
                rule,
                value,
            } => CliError {
                code: "INVALID_VALUE".to_string(),
                message: format!("Wrong input for field {metric}: {value:?}"),
                hint: Some(format!("Values for {metric} must follow the '{rule}' rule")),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ViewReport {
    metric: String,
    first_day: NaiveDate,
    last_day: NaiveDate,
    grid: Vec<Vec<String>>,
    summary: Option<Summary>,
}
