use crate::error::FilterError;
use crate::filter::FilterValues;
use crate::models::timestamp;
use regex::{Captures, Regex};
use std::sync::OnceLock;

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)(after|before):(\S+)").expect("valid range regex"))
}

fn flag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)([+-])([A-Za-z]+)\b").expect("valid flag regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Parses a filter line such as `rent after:2024-01-01 +completed -active`.
///
/// Words that are neither a range nor a known flag make up the search text.
pub fn parse_filter_input(input: &str) -> Result<FilterValues, FilterError> {
    let mut filter = FilterValues::default();

    // Ranges
    for caps in range_re().captures_iter(input) {
        let key = if &caps[1] == "after" { "after" } else { "before" };
        let raw = &caps[2];
        let parsed = timestamp::parse(raw).ok_or_else(|| FilterError::InvalidDate {
            key,
            value: raw.to_string(),
        })?;
        if key == "after" {
            filter.start_time = Some(parsed);
        } else {
            filter.end_time = Some(parsed);
        }
    }
    let rest = range_re().replace_all(input, " ");

    // Flags; any other +word or -word is search text
    let rest = flag_re().replace_all(&rest, |caps: &Captures| {
        let on = &caps[1] == "+";
        match caps[2].to_ascii_lowercase().as_str() {
            "completed" | "complete" => filter.todos.completed = on,
            "cancelled" | "canceled" => filter.todos.cancelled = on,
            "active" => filter.todos.active = on,
            "applied" => filter.actions.applied_to_todo = on,
            "unapplied" => filter.actions.not_applied_to_todo = on,
            _ => return caps[0].to_string(),
        }
        " ".to_string()
    });

    filter.search = whitespace_re().replace_all(&rest, " ").trim().to_string();

    Ok(filter)
}
