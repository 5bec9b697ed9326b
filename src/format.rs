use crate::models::{Action, Note, Todo};
use chrono::{DateTime, Utc};

pub fn pad_id(id: u64) -> String {
    format!("[{:04}]", id)
}

/// `MM-DD HH:MM:SS` in UTC.
pub fn format_datetime(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|dt| dt.format("%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Hard-wraps `text` into lines of at most `width - 8 * indents` characters,
/// each prefixed with four spaces per indent level.
pub fn format_paragraph(text: &str, width: usize, indents: usize) -> Vec<String> {
    let space = width.saturating_sub(8 * indents).max(1);
    let prefix = "    ".repeat(indents);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![prefix];
    }
    chars
        .chunks(space)
        .map(|chunk| format!("{}{}", prefix, chunk.iter().collect::<String>()))
        .collect()
}

pub fn todo_heading(todo: &Todo) -> String {
    format!("{}: {}", pad_id(todo.id), todo.todo_text)
}

/// Scheduling window and creation time, e.g. `01-02 09:00:00 -> * | Created: ...`.
pub fn todo_details(todo: &Todo) -> String {
    let mut parts = Vec::new();
    if todo.target_start_time.is_some() || todo.target_end_time.is_some() {
        parts.push(format!(
            "{} -> {}",
            or_star(format_datetime(todo.target_start_time)),
            or_star(format_datetime(todo.target_end_time)),
        ));
    }
    if let Some(created) = todo.created_at() {
        parts.push(format!("Created: {}", format_datetime(Some(created))));
    }
    parts.join(" | ")
}

fn or_star(value: String) -> String {
    if value.is_empty() {
        "*".to_string()
    } else {
        value
    }
}

/// Processing summary shown next to a note.
pub fn note_status(note: &Note) -> String {
    if !note.processed {
        return "Unprocessed".to_string();
    }
    let mut parts = Vec::new();
    if let Some(actions) = note.num_actions.filter(|n| *n > 0) {
        parts.push(format!("Actions: {}", actions));
    }
    if let Some(todos) = note.num_todos.filter(|n| *n > 0) {
        parts.push(format!("Todos: {}", todos));
    }
    if parts.is_empty() {
        "Note".to_string()
    } else {
        parts.join(" | ")
    }
}

pub fn category_name(note: &Note) -> &str {
    note.category
        .as_ref()
        .map(|category| category.name.as_str())
        .unwrap_or("Uncategorized")
}

pub fn action_text(action: &Action) -> String {
    match (&action.todo_id, &action.todo) {
        (Some(_), Some(todo)) => format!("{} -> {}", action.action_text, todo.todo_text),
        _ => action.action_text.clone(),
    }
}
