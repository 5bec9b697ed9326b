use crate::models::Todo;
use chrono::{DateTime, Utc};
use ratatui::style::Color;
use thiserror::Error;
use std::fmt;
use std::str::FromStr;

/// Where a todo stands relative to a reference instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TodoStatus {
    New,
    Scheduled,
    Started,
    Late,
    Complete,
    Cancelled,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 6] = [
        TodoStatus::New,
        TodoStatus::Scheduled,
        TodoStatus::Started,
        TodoStatus::Late,
        TodoStatus::Complete,
        TodoStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::New => "new",
            TodoStatus::Scheduled => "scheduled",
            TodoStatus::Started => "started",
            TodoStatus::Late => "late",
            TodoStatus::Complete => "complete",
            TodoStatus::Cancelled => "cancelled",
        }
    }

    /// Foreground colour for rows with this status. New and scheduled todos
    /// use the terminal's normal text colour.
    pub fn color(self) -> Color {
        match self {
            TodoStatus::New | TodoStatus::Scheduled => Color::Reset,
            TodoStatus::Complete => Color::Green,
            TodoStatus::Cancelled => Color::Gray,
            TodoStatus::Late => Color::Red,
            TodoStatus::Started => Color::Yellow,
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown todo status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TodoStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TodoStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// First matching rule wins: complete, cancelled, late, started, scheduled, new.
pub fn classify(
    complete: bool,
    cancelled: bool,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> TodoStatus {
    if complete {
        TodoStatus::Complete
    } else if cancelled {
        TodoStatus::Cancelled
    } else if end.is_some_and(|end| end < now) {
        TodoStatus::Late
    } else if start.is_some_and(|start| start < now) {
        TodoStatus::Started
    } else if start.is_some() || end.is_some() {
        TodoStatus::Scheduled
    } else {
        TodoStatus::New
    }
}

impl Todo {
    pub fn status(&self, now: DateTime<Utc>) -> TodoStatus {
        classify(
            self.complete,
            self.cancelled,
            self.target_start_time,
            self.target_end_time,
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_past_end_is_late() {
        let status = classify(false, false, None, Some(at(2020, 1, 1)), at(2024, 1, 1));
        assert_eq!(status, TodoStatus::Late);
    }

    #[test]
    fn test_complete_beats_late() {
        for now in [at(2019, 1, 1), at(2024, 1, 1)] {
            let status = classify(true, false, None, Some(at(2020, 1, 1)), now);
            assert_eq!(status, TodoStatus::Complete);
        }
    }

    #[test]
    fn test_no_times_is_new() {
        assert_eq!(classify(false, false, None, None, at(2024, 1, 1)), TodoStatus::New);
    }

    #[test]
    fn test_complete_beats_cancelled() {
        assert_eq!(classify(true, true, None, None, at(2024, 1, 1)), TodoStatus::Complete);
        assert_eq!(classify(false, true, None, Some(at(2020, 1, 1)), at(2024, 1, 1)), TodoStatus::Cancelled);
    }

    #[test]
    fn test_started_until_end_passes() {
        let now = at(2024, 6, 1);
        let start = Some(now - Duration::days(2));
        assert_eq!(classify(false, false, start, Some(now + Duration::days(2)), now), TodoStatus::Started);
        assert_eq!(classify(false, false, start, None, now), TodoStatus::Started);
        assert_eq!(classify(false, false, start, Some(now - Duration::days(1)), now), TodoStatus::Late);
    }

    #[test]
    fn test_future_window_is_scheduled() {
        let now = at(2024, 6, 1);
        let later = Some(now + Duration::hours(1));
        assert_eq!(classify(false, false, later, None, now), TodoStatus::Scheduled);
        assert_eq!(classify(false, false, None, later, now), TodoStatus::Scheduled);
        assert_eq!(classify(false, false, later, later, now), TodoStatus::Scheduled);
    }

    #[test]
    fn test_boundary_instant_is_not_past() {
        let now = at(2024, 6, 1);
        assert_eq!(classify(false, false, None, Some(now), now), TodoStatus::Scheduled);
        assert_eq!(classify(false, false, Some(now), None, now), TodoStatus::Scheduled);
    }

    #[test]
    fn test_exactly_one_rule_matches_in_order() {
        let now = at(2024, 6, 1);
        let times = [None, Some(now - Duration::days(1)), Some(now + Duration::days(1))];
        for complete in [false, true] {
            for cancelled in [false, true] {
                for start in times {
                    for end in times {
                        let expected = if complete {
                            TodoStatus::Complete
                        } else if cancelled {
                            TodoStatus::Cancelled
                        } else if end.is_some_and(|e| e < now) {
                            TodoStatus::Late
                        } else if start.is_some_and(|s| s < now) {
                            TodoStatus::Started
                        } else if start.is_some() || end.is_some() {
                            TodoStatus::Scheduled
                        } else {
                            TodoStatus::New
                        };
                        assert_eq!(classify(complete, cancelled, start, end, now), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_colors() {
        assert_eq!(TodoStatus::New.color(), TodoStatus::Scheduled.color());
        assert_eq!(TodoStatus::Complete.color(), Color::Green);
        assert_eq!(TodoStatus::Cancelled.color(), Color::Gray);
        assert_eq!(TodoStatus::Late.color(), Color::Red);
        assert_eq!(TodoStatus::Started.color(), Color::Yellow);
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!("Late".parse::<TodoStatus>(), Ok(TodoStatus::Late));
        assert_eq!(" started ".parse::<TodoStatus>(), Ok(TodoStatus::Started));
        assert_eq!(
            "pink".parse::<TodoStatus>(),
            Err(UnknownStatus("pink".to_string()))
        );
        for status in TodoStatus::ALL {
            assert_eq!(status.to_string().parse::<TodoStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_todo_status_uses_record_fields() {
        let mut todo = Todo::new(1, "file taxes");
        todo.target_end_time = Some(at(2020, 1, 1));
        assert_eq!(todo.status(at(2024, 1, 1)), TodoStatus::Late);
        todo.complete = true;
        assert_eq!(todo.status(at(2024, 1, 1)), TodoStatus::Complete);
    }
}
