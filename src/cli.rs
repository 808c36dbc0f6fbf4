use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trackmaster", about = "Personal task and habit tracker", version)]
pub struct Cli {
    /// Path to the SQLite database [default: ~/.trackmaster/trackmaster.db]
    #[arg(long, env = "TRACKMASTER_DB", global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create database and tables (idempotent)
    Init,

    /// Add a one-off task or a tracker
    Add {
        /// Task title
        title: String,
        /// Create a recurring tracker instead of a one-off task
        #[arg(short, long)]
        tracker: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show pending one-off tasks and all trackers
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Re-render whenever the database changes
        #[arg(short, long)]
        follow: bool,
    },

    /// Mark a one-off task as done
    Done {
        /// Task id or unique id prefix
        task: String,
    },

    /// Remove a task and all of its logs
    Rm {
        /// Task id or unique id prefix
        task: String,
    },

    /// Record an entry for a tracker
    Log {
        /// Tracker id or unique id prefix
        tracker: String,
        /// Optional note
        #[arg(default_value = "")]
        note: String,
        /// Entry time as RFC 3339 (e.g. 2024-01-02T09:00:00Z) [default: now]
        #[arg(long)]
        at: Option<String>,
    },

    /// Show a tracker's entries grouped by day, latest first
    History {
        /// Tracker id or unique id prefix
        tracker: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the note of a log entry
    #[command(name = "edit-log")]
    EditLog {
        /// Log id or unique id prefix
        log: String,
        /// New note (may be empty)
        note: String,
    },

    /// Remove a single log entry
    #[command(name = "rm-log")]
    RmLog {
        /// Log id or unique id prefix
        log: String,
    },
}
