mod cli;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use trackmaster::model::TaskKind;
use trackmaster::view::{self, Board};
use trackmaster::{ops, output, paths, watch, SqliteStore};

/// Structured logs go to stderr so stdout stays parseable for `--json`.
/// The filter comes from `TRACKMASTER_LOG` (e.g. `debug`,
/// `trackmaster::store=debug`) and defaults to `warn`.
fn init_logging() {
    let filter = EnvFilter::try_from_env("TRACKMASTER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn open_store(db_path: &str) -> Result<SqliteStore> {
    paths::ensure_db_dir(db_path)?;
    SqliteStore::open(db_path).with_context(|| format!("failed to open database {db_path}"))
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    let ts = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp '{raw}': expected RFC 3339"))?;
    Ok(ts.with_timezone(&Utc))
}

/// Follow mode emits one compact JSON document per line so the stream stays
/// parseable.
fn print_board(store: &SqliteStore, json: bool, follow: bool) -> Result<()> {
    let board = Board::load(store)?;
    if json && follow {
        println!("{}", output::board_json_line(&board)?);
    } else if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        print!("{}", output::format_board(&board, &Local));
    }
    Ok(())
}

fn main() {
    init_logging();
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let db_path = paths::resolve_db_path(cli.db)?;
    let store = open_store(&db_path)?;

    match cli.command {
        Command::Init => {
            eprintln!("Initialized {db_path}");
        }

        Command::Add {
            title,
            tracker,
            json,
        } => {
            let kind = if tracker {
                TaskKind::Tracker
            } else {
                TaskKind::OneOff
            };
            let task = ops::create_task(&store, &title, kind)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                println!("{}", task.id);
                eprintln!("Added {} '{}'", kind_label(kind), task.title);
            }
        }

        Command::List { json, follow } => {
            if follow {
                let (_watcher, rx) = watch::watch_db(&db_path)?;
                loop {
                    print_board(&store, json, true)?;
                    if !watch::wait_for_change(&rx, Duration::MAX) {
                        break;
                    }
                    // SQLite touches several files per commit; let them settle.
                    std::thread::sleep(Duration::from_millis(50));
                    watch::drain_events(&rx);
                    if !json {
                        println!();
                    }
                }
            } else {
                print_board(&store, json, false)?;
            }
        }

        Command::Done { task } => {
            let task = ops::complete_task(&store, &task)?;
            eprintln!("Marked '{}' as done", task.title);
        }

        Command::Rm { task } => {
            let task = ops::remove_task(&store, &task)?;
            eprintln!("Removed {} '{}'", kind_label(task.kind), task.title);
        }

        Command::Log { tracker, note, at } => {
            let at = at.as_deref().map(parse_time).transpose()?;
            let log = ops::log_entry(&store, &tracker, &note, at)?;
            println!("{}", log.id);
            eprintln!("Logged entry");
        }

        Command::History { tracker, json } => {
            let task = ops::resolve_tracker(&store, &tracker)?;
            let days = view::tracker_history(&store, &task.id, &Local)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&days)?);
            } else {
                let today = Local::now().date_naive();
                print!("{}", output::format_history(&task, &days, today, &Local));
            }
        }

        Command::EditLog { log, note } => {
            let log = ops::edit_log_note(&store, &log, &note)?;
            eprintln!("Updated note on entry {}", output::short_id(&log.id));
        }

        Command::RmLog { log } => {
            let log = ops::remove_log(&store, &log)?;
            eprintln!("Removed entry {}", output::short_id(&log.id));
        }
    }

    Ok(())
}

fn kind_label(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::OneOff => "task",
        TaskKind::Tracker => "tracker",
    }
}
