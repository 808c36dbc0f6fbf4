use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::model::{Log, Task};
use crate::view::{Board, DayGroup};

/// Width of the id column; long enough to be a unique prefix in practice.
const SHORT_ID: usize = 8;

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// `Today`, `Yesterday`, or e.g. `Monday, 01 January`.
pub fn format_day_header(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        return "Today".to_string();
    }
    if today.pred_opt() == Some(date) {
        return "Yesterday".to_string();
    }
    let mut header = date.format("%A, %d %B").to_string();
    if date.year() != today.year() {
        header.push_str(&format!(" {}", date.year()));
    }
    header
}

pub fn format_last_logged<Tz: TimeZone>(ts: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match ts {
        Some(ts) => ts.with_timezone(tz).format("%d/%m %H:%M").to_string(),
        None => "never".to_string(),
    }
}

fn task_line(task: &Task) -> String {
    format!("{} {}  {}\n", task.icon(), short_id(&task.id), task.title)
}

/// One board snapshot as a single line of JSON, for streaming refreshes.
pub fn board_json_line(board: &Board) -> serde_json::Result<String> {
    serde_json::to_string(board)
}

pub fn format_board<Tz: TimeZone>(board: &Board, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    let pending = &board.items.pending_one_off;
    out.push_str(&format!("Pending ({})\n", pending.len()));
    if pending.is_empty() {
        out.push_str("  nothing pending\n");
    }
    for task in pending {
        out.push_str("  ");
        out.push_str(&task_line(task));
    }

    out.push('\n');
    let trackers = &board.items.trackers;
    out.push_str(&format!("Trackers ({})\n", trackers.len()));
    if trackers.is_empty() {
        out.push_str("  no trackers yet\n");
    }
    for task in trackers {
        let last = format_last_logged(board.last_logged(&task.id), tz);
        out.push_str(&format!(
            "  {} {}  {}  (last: {last})\n",
            task.icon(),
            short_id(&task.id),
            task.title
        ));
    }
    out
}

fn log_line<Tz: TimeZone>(log: &Log, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let time = log.timestamp.with_timezone(tz).format("%H:%M");
    if log.note.is_empty() {
        format!("  {time}  {}\n", short_id(&log.id))
    } else {
        format!("  {time}  {}  {}\n", short_id(&log.id), log.note)
    }
}

pub fn format_history<Tz: TimeZone>(
    tracker: &Task,
    days: &[DayGroup],
    today: NaiveDate,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = format!("History: {}\n", tracker.title);
    if days.is_empty() {
        out.push_str("\nNo entries yet.\n");
        return out;
    }
    for day in days {
        out.push('\n');
        out.push_str(&format_day_header(day.date, today));
        out.push('\n');
        for log in &day.logs {
            out.push_str(&log_line(log, tz));
        }
    }
    out
}
