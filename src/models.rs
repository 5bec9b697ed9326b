use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// The four record collections the backend serves, in tab order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Notes,
    Todos,
    Actions,
    Curiosities,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Notes,
        RecordKind::Todos,
        RecordKind::Actions,
        RecordKind::Curiosities,
    ];

    /// Path segment under `/api/`.
    pub fn path(self) -> &'static str {
        match self {
            RecordKind::Notes => "notes",
            RecordKind::Todos => "todos",
            RecordKind::Actions => "actions",
            RecordKind::Curiosities => "curiosities",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RecordKind::Notes => "Notes",
            RecordKind::Todos => "Todos",
            RecordKind::Actions => "Actions",
            RecordKind::Curiosities => "Curiosities",
        }
    }

    fn position(self) -> usize {
        RecordKind::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> RecordKind {
        RecordKind::ALL[(self.position() + 1) % RecordKind::ALL.len()]
    }

    pub fn previous(self) -> RecordKind {
        let len = RecordKind::ALL.len();
        RecordKind::ALL[(self.position() + len - 1) % len]
    }
}

/// One fetched page of records for a tab.
#[derive(Clone, Debug, PartialEq)]
pub enum Records {
    Notes(Vec<Note>),
    Todos(Vec<Todo>),
    Actions(Vec<Action>),
    Curiosities(Vec<Curiosity>),
}

// Todo record as served by /api/todos
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Todo {
    pub id: u64,
    #[serde(default)]
    pub todo_text: String,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub target_start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub target_end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub source_note_id: Option<u64>,
    #[serde(default)]
    pub source_annotation: Option<SourceAnnotation>,
    /// Fields this client does not interpret, kept as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Todo {
    pub fn new(id: u64, todo_text: impl Into<String>) -> Self {
        Todo {
            id,
            todo_text: todo_text.into(),
            complete: false,
            cancelled: false,
            target_start_time: None,
            target_end_time: None,
            parent_id: None,
            source_note_id: None,
            source_annotation: None,
            extra: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Timestamp of the note the todo was extracted from, when the backend sent it.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.source_annotation
            .as_ref()
            .and_then(|annotation| annotation.note.as_ref())
            .and_then(|note| note.timestamp)
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct SourceAnnotation {
    #[serde(default)]
    pub note: Option<NoteStamp>,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct NoteStamp {
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

// Note record, with the category the backend attaches
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Note {
    pub id: u64,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note_text: String,
    #[serde(default)]
    pub processed_note_text: String,
    #[serde(default)]
    pub processing_error: String,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub num_actions: Option<u64>,
    #[serde(default)]
    pub num_todos: Option<u64>,
}

impl Note {
    /// The processed text when the backend produced one, the raw text otherwise.
    pub fn display_text(&self) -> &str {
        if self.processed_note_text.is_empty() {
            &self.note_text
        } else {
            &self.processed_note_text
        }
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Action {
    pub id: u64,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub action_text: String,
    #[serde(default)]
    pub todo_id: Option<u64>,
    #[serde(default)]
    pub mark_complete: bool,
    #[serde(default)]
    pub todo: Option<Todo>,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Curiosity {
    pub id: u64,
    #[serde(default, alias = "annotation_text")]
    pub curiosity_text: String,
    #[serde(default)]
    pub note: Option<Note>,
}

// Response of the summaries/query endpoint
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Summary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "paragraphs")]
    pub summary: Vec<String>,
}

fn paragraphs<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Chunks(Vec<String>),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Chunks(chunks)) => chunks,
        Some(Raw::Text(text)) => text.split('\n').map(str::to_string).collect(),
        None => Vec::new(),
    })
}

pub mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    /// Parses the timestamp shapes the backend emits. Values without an
    /// offset are taken as UTC.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse(value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp: {value}"))),
        }
    }
}
