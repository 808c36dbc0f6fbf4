use anyhow::{bail, Result};

/// Validate and normalize a task title: surrounding whitespace is dropped and
/// the remainder must be non-empty.
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        bail!("task title must not be empty");
    }
    Ok(trimmed.to_string())
}

/// Log notes are free text; only surrounding whitespace is removed.
pub fn normalize_note(note: &str) -> String {
    note.trim().to_string()
}

/// An id lookup key must be non-empty and contain no whitespace.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("id must not be empty");
    }
    if key.chars().any(char::is_whitespace) {
        bail!("id '{key}' contains whitespace");
    }
    Ok(())
}
