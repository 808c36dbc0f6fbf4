use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Whether `path` is the database file or one of its `-wal`/`-shm`/`-journal`
/// siblings.
fn touches_db(path: &Path, db_filename: &str) -> bool {
    path.file_name()
        .map(|f| f.to_string_lossy().starts_with(db_filename))
        .unwrap_or(false)
}

/// Watch the database's directory and signal on every write to the database.
/// The watcher must be kept alive for events to be received.
pub fn watch_db(db_path: &str) -> Result<(RecommendedWatcher, Receiver<()>)> {
    let (tx, rx) = mpsc::channel();

    let db_filename = Path::new(db_path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            // Reads by this very process would otherwise wake us in a loop.
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            if event.paths.iter().any(|p| touches_db(p, &db_filename)) {
                let _ = tx.send(());
            }
        }
    })
    .context("failed to create file watcher")?;

    let path = Path::new(db_path);
    let watch_path = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    watcher
        .watch(watch_path, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", watch_path.display()))?;

    Ok((watcher, rx))
}

/// Waits for a database change event with timeout.
/// Returns true if an event was received, false on timeout or disconnect.
pub fn wait_for_change(rx: &Receiver<()>, timeout: Duration) -> bool {
    rx.recv_timeout(timeout).is_ok()
}

/// Drains any pending events from the receiver.
pub fn drain_events(rx: &Receiver<()>) {
    while rx.try_recv().is_ok() {}
}
