use crate::models::RecordKind;
use chrono::{DateTime, Utc};
use std::fmt;

const PARAM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Filters applied to whichever tab is being fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterValues {
    pub search: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub actions: ActionFilter,
    pub todos: TodoFilter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionFilter {
    pub applied_to_todo: bool,
    pub not_applied_to_todo: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TodoFilter {
    pub completed: bool,
    pub cancelled: bool,
    pub active: bool,
}

impl Default for FilterValues {
    fn default() -> Self {
        FilterValues {
            search: String::new(),
            start_time: None,
            end_time: None,
            actions: ActionFilter {
                applied_to_todo: true,
                not_applied_to_todo: true,
            },
            todos: TodoFilter {
                completed: false,
                cancelled: false,
                active: true,
            },
        }
    }
}

impl FilterValues {
    pub fn is_default(&self) -> bool {
        *self == FilterValues::default()
    }

    /// Query parameters for a list request on `kind`.
    pub fn query_params(&self, kind: RecordKind, limit: usize) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = self.start_time {
            params.push(("startTime", start.format(PARAM_TIME_FORMAT).to_string()));
        }
        if let Some(end) = self.end_time {
            params.push(("endTime", end.format(PARAM_TIME_FORMAT).to_string()));
        }
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
        match kind {
            RecordKind::Todos => {
                params.push(("completed", self.todos.completed.to_string()));
                params.push(("cancelled", self.todos.cancelled.to_string()));
                params.push(("active", self.todos.active.to_string()));
            }
            RecordKind::Actions => {
                if let Some(applied) = self.actions.applied_to_todo() {
                    params.push(("appliedToTodo", applied.to_string()));
                }
            }
            RecordKind::Notes | RecordKind::Curiosities => {}
        }
        params.push(("limit", limit.to_string()));
        params
    }
}

impl ActionFilter {
    /// `None` when both or neither box is ticked, meaning no restriction.
    pub fn applied_to_todo(&self) -> Option<bool> {
        match (self.applied_to_todo, self.not_applied_to_todo) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }
}

/// Writes the filter back in the syntax accepted by the filter popup.
impl fmt::Display for FilterValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let defaults = FilterValues::default();
        let mut parts: Vec<String> = Vec::new();
        if !self.search.trim().is_empty() {
            parts.push(self.search.trim().to_string());
        }
        if let Some(start) = self.start_time {
            parts.push(format!("after:{}", start.format("%Y-%m-%dT%H:%M:%S")));
        }
        if let Some(end) = self.end_time {
            parts.push(format!("before:{}", end.format("%Y-%m-%dT%H:%M:%S")));
        }
        let flags = [
            ("completed", self.todos.completed, defaults.todos.completed),
            ("cancelled", self.todos.cancelled, defaults.todos.cancelled),
            ("active", self.todos.active, defaults.todos.active),
            ("applied", self.actions.applied_to_todo, defaults.actions.applied_to_todo),
            (
                "unapplied",
                self.actions.not_applied_to_todo,
                defaults.actions.not_applied_to_todo,
            ),
        ];
        for (name, value, default) in flags {
            if value != default {
                parts.push(format!("{}{}", if value { '+' } else { '-' }, name));
            }
        }
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn value<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn test_todo_params_always_send_flags() {
        let params = FilterValues::default().query_params(RecordKind::Todos, 50);
        assert_eq!(value(&params, "completed"), Some("false"));
        assert_eq!(value(&params, "cancelled"), Some("false"));
        assert_eq!(value(&params, "active"), Some("true"));
        assert_eq!(value(&params, "limit"), Some("50"));
        assert_eq!(value(&params, "search"), None);
    }

    #[test]
    fn test_notes_params_skip_todo_flags() {
        let mut filter = FilterValues::default();
        filter.search = "  garden ".to_string();
        filter.start_time = Some(Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap());
        let params = filter.query_params(RecordKind::Notes, 25);
        assert_eq!(value(&params, "search"), Some("garden"));
        assert_eq!(value(&params, "startTime"), Some("2024-02-03 04:05:06"));
        assert_eq!(value(&params, "completed"), None);
        assert_eq!(value(&params, "limit"), Some("25"));
    }

    #[test]
    fn test_applied_to_todo_only_when_one_box_ticked() {
        let mut filter = FilterValues::default();
        let params = filter.query_params(RecordKind::Actions, 50);
        assert_eq!(value(&params, "appliedToTodo"), None);

        filter.actions.not_applied_to_todo = false;
        let params = filter.query_params(RecordKind::Actions, 50);
        assert_eq!(value(&params, "appliedToTodo"), Some("true"));

        filter.actions = ActionFilter {
            applied_to_todo: false,
            not_applied_to_todo: true,
        };
        let params = filter.query_params(RecordKind::Actions, 50);
        assert_eq!(value(&params, "appliedToTodo"), Some("false"));
    }

    #[test]
    fn test_display_lists_only_changes() {
        assert_eq!(FilterValues::default().to_string(), "");
        let mut filter = FilterValues::default();
        filter.search = "rent".to_string();
        filter.todos.completed = true;
        filter.todos.active = false;
        assert_eq!(filter.to_string(), "rent +completed -active");
    }

    #[test]
    fn test_display_keeps_seconds() {
        let mut filter = FilterValues::default();
        filter.start_time = Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 30).unwrap());
        filter.end_time = Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(
            filter.to_string(),
            "after:2024-01-01T10:00:30 before:2024-01-02T00:00:00"
        );
    }
}
