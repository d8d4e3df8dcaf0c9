mod catalog;
mod config;
mod error;
mod models;
mod panel;
mod query;
mod resolver;
mod storage;
mod tui;
mod utils;

use anyhow::Result;
use catalog::DISPLAY_ORDER;
use chrono::Local;
use clap::{Parser, Subcommand};
use fd_lock::RwLock;
use models::{FieldValue, FormFields, Step, RANGE_FIELD, STEP_FIELD};
use panel::DurationPanel;
use resolver::disabled_date;
use std::fs::OpenOptions;
use storage::{FileStore, KeyValueStore};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utils::{format_span, format_step, parse_picker_instant, parse_step};

#[derive(Parser)]
#[command(name = "spanpick")]
#[command(about = "Pick and persist the time window for dashboard queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current time window
    Show {
        /// Print the query descriptor as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the shortcut presets
    List,
    /// Select a shortcut by label or code (e.g. 7d, 15m)
    Shortcut {
        name: String,
        /// Keep the persisted custom range so it still wins on next start
        #[arg(long)]
        keep_range: bool,
    },
    /// Select an explicit range
    Range {
        /// Start (YYYY-MM-DD HH:MM or YYYY/MM/DD)
        begin: String,
        /// End (YYYY-MM-DD HH:MM or YYYY/MM/DD)
        end: String,
        /// Reload interval (e.g. 5s, 10000, 0 to disable)
        #[arg(short, long)]
        step: Option<String>,
    },
    /// Set the reload interval (e.g. 5s, 10000, 0 to disable)
    Step { step: String },
    /// Open the interactive panel
    Panel,
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config()?;
    init_logging(&config.log_level);

    let store = config.open_store()?;
    let mut panel = DurationPanel::mount(store, Step::from_millis(config.default_step_ms));

    match cli.command {
        Commands::Show { json } => {
            if json {
                let query = panel.query_duration(Local::now());
                println!("{}", serde_json::to_string_pretty(&query)?);
            } else {
                print_selection(&panel);
            }
        }
        Commands::List => {
            let now = Local::now();
            for kind in DISPLAY_ORDER {
                println!("{}", kind.title());
                for entry in kind.entries() {
                    let marker = if panel.current().label == Some(entry.label) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        " {} {:<6} {:<10} {} .. {}",
                        marker,
                        entry.code,
                        entry.label,
                        entry.from(now).format("%Y-%m-%d %H:%M"),
                        entry.to(now).format("%H:%M")
                    );
                }
            }
        }
        Commands::Shortcut { name, keep_range } => {
            let entry = catalog::lookup(&name).ok_or_else(|| {
                anyhow::anyhow!("Unknown shortcut '{}'. Try `spanpick list`.", name)
            })?;
            panel.click_shortcut(entry, !keep_range)?;
            print_selection(&panel);
        }
        Commands::Range { begin, end, step } => {
            let fields = validate_range_form(&begin, &end, step.as_deref())?;
            panel.submit(&fields)?;
            print_selection(&panel);
        }
        Commands::Step { step } => {
            panel.set_step(parse_step(&step)?)?;
            print_selection(&panel);
        }
        Commands::Panel => {
            let base_dir = FileStore::get_base_dir()?;
            let lock_path = base_dir.join("spanpick.lock");
            let lock_file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(lock_path)?;

            let mut lock = RwLock::new(lock_file);
            let _guard = lock.try_write().map_err(|_| {
                anyhow::anyhow!("Another spanpick panel is already open. Please close it before starting a new one.")
            })?;

            info!("panel opened");
            tui::run_tui(&mut panel)?;
            print_selection(&panel);
        }
    }

    Ok(())
}

/// The form layer: parse and check the raw input before it reaches the resolver.
fn validate_range_form(begin: &str, end: &str, step: Option<&str>) -> Result<FormFields> {
    let now = Local::now();
    let start = parse_picker_instant(begin)
        .ok_or_else(|| anyhow::anyhow!("Invalid start time '{}'", begin))?;
    let end = parse_picker_instant(end)
        .ok_or_else(|| anyhow::anyhow!("Invalid end time '{}'", end))?;

    if disabled_date(start, now) || disabled_date(end, now) {
        anyhow::bail!("Range endpoints must lie in the past");
    }
    if start >= end {
        anyhow::bail!("Start time must be before end time");
    }

    let mut fields = FormFields::new();
    fields.insert(RANGE_FIELD.to_string(), FieldValue::Range(start, end));
    let step = match step {
        Some(raw) => FieldValue::Scalar(parse_step(raw)?.to_string()),
        None => FieldValue::Empty,
    };
    fields.insert(STEP_FIELD.to_string(), step);
    Ok(fields)
}

fn print_selection<S: KeyValueStore>(panel: &DurationPanel<S>) {
    let now = Local::now();
    let current = panel.current();
    let (start, end) = (current.from(now), current.to(now));

    let selection = if current.is_custom() {
        "custom range"
    } else {
        current.label.unwrap_or_default()
    };

    println!("Selection: {}", selection);
    println!("From:      {}", start.format("%Y-%m-%d %H:%M"));
    println!("To:        {}", end.format("%Y-%m-%d %H:%M"));
    println!("Span:      {}", format_span(end - start));
    println!("Reload:    {}", format_step(current.step));
}
