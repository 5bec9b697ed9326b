use crate::api::ApiClient;
use crate::filter::FilterValues;
use crate::models::{Action, Curiosity, Note, RecordKind, Records, Summary};
use crate::parser::parse_filter_input;
use crate::tree::{build_forest, count, flatten, TodoNode};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use serde_json::Value;
use tracing::{error, info};

pub struct App {
    pub api: ApiClient,
    pub limit: usize,
    pub tab: RecordKind,
    pub content: TabContent,
    pub state: ListState,
    pub filter: FilterValues,
    pub input_mode: InputMode,
    pub filter_input: String,
    pub note_input: String,
    pub query_input: String,
    pub query: QueryState,
    pub detail: Option<Value>,
    pub status_line: Option<String>,
}

/// What the middle panel currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum TabContent {
    Loading,
    Notes(Vec<Note>),
    Todos(Vec<TodoNode>),
    Actions(Vec<Action>),
    Curiosities(Vec<Curiosity>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Idle,
    Answered(Summary),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Note,
    Filter,
    Query,
    Detail,
}

impl TabContent {
    pub fn len(&self) -> usize {
        match self {
            TabContent::Notes(notes) => notes.len(),
            TabContent::Todos(forest) => count(forest),
            TabContent::Actions(actions) => actions.len(),
            TabContent::Curiosities(curiosities) => curiosities.len(),
            TabContent::Loading | TabContent::Failed(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record id behind the row at `index`, in display order.
    pub fn id_at(&self, index: usize) -> Option<u64> {
        match self {
            TabContent::Notes(notes) => notes.get(index).map(|note| note.id),
            TabContent::Todos(forest) => flatten(forest).get(index).map(|row| row.todo.id),
            TabContent::Actions(actions) => actions.get(index).map(|action| action.id),
            TabContent::Curiosities(curiosities) => curiosities.get(index).map(|c| c.id),
            TabContent::Loading | TabContent::Failed(_) => None,
        }
    }
}

impl App {
    pub fn new(api: ApiClient, limit: usize) -> App {
        App {
            api,
            limit,
            tab: RecordKind::Notes,
            content: TabContent::Loading,
            state: ListState::default(),
            filter: FilterValues::default(),
            input_mode: InputMode::Normal,
            filter_input: String::new(),
            note_input: String::new(),
            query_input: String::new(),
            query: QueryState::Idle,
            detail: None,
            status_line: None,
        }
    }

    /// Replaces the panel with a freshly fetched batch. Todos are rebuilt into
    /// a forest every time; nothing from the previous batch is kept.
    pub fn set_records(&mut self, records: Records) {
        self.content = match records {
            Records::Notes(notes) => TabContent::Notes(notes),
            Records::Todos(todos) => match build_forest(todos) {
                Ok(forest) => TabContent::Todos(forest),
                Err(err) => {
                    error!(%err, "could not assemble todo tree");
                    TabContent::Failed(err.to_string())
                }
            },
            Records::Actions(actions) => TabContent::Actions(actions),
            Records::Curiosities(curiosities) => TabContent::Curiosities(curiosities),
        };
        let selected = if self.content.is_empty() { None } else { Some(0) };
        self.state.select(selected);
    }

    pub async fn refresh(&mut self) {
        match self
            .api
            .fetch_records(self.tab, &self.filter, self.limit)
            .await
        {
            Ok(records) => self.set_records(records),
            Err(err) => {
                error!(tab = self.tab.path(), %err, "error fetching records");
                self.content = TabContent::Failed(err.to_string());
                self.state.select(None);
            }
        }
    }

    /// Switches the visible tab without fetching.
    pub fn select_tab(&mut self, tab: RecordKind) {
        if self.tab != tab {
            info!(from = self.tab.path(), to = tab.path(), "switching tab");
        }
        self.tab = tab;
        self.content = TabContent::Loading;
        self.state.select(None);
    }

    pub async fn switch_tab(&mut self, tab: RecordKind) {
        self.select_tab(tab);
        self.refresh().await;
    }

    pub fn next(&mut self) {
        let len = self.content.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.content.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.state.selected().and_then(|i| self.content.id_at(i))
    }

    pub async fn open_detail(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.api.fetch_detail(self.tab, id).await {
            Ok(detail) => {
                self.detail = Some(detail);
                self.input_mode = InputMode::Detail;
            }
            Err(err) => {
                error!(tab = self.tab.path(), id, %err, "error fetching details");
                self.status_line = Some(format!("Error: {}", err));
            }
        }
    }

    /// Parses the filter line; on success the filter is replaced and the tab refetched.
    pub async fn apply_filter_input(&mut self) {
        match parse_filter_input(&self.filter_input) {
            Ok(filter) => {
                self.filter = filter;
                self.input_mode = InputMode::Normal;
                self.status_line = None;
                self.refresh().await;
            }
            Err(err) => {
                self.status_line = Some(format!("Error: {}", err));
            }
        }
    }

    pub async fn clear_filter(&mut self) {
        self.filter = FilterValues::default();
        self.filter_input.clear();
        self.refresh().await;
    }

    pub async fn submit_note(&mut self) {
        let note_text = self.note_input.trim().to_string();
        if note_text.is_empty() {
            self.status_line = Some("Please enter a note".to_string());
            return;
        }
        match self.api.create_note(&note_text).await {
            Ok(note) => {
                info!(id = note.id, "note created");
                self.note_input.clear();
                self.input_mode = InputMode::Normal;
                self.status_line = Some(format!("Created note {}", note.id));
                self.refresh().await;
            }
            Err(err) => {
                error!(%err, "error creating note");
                self.status_line = Some(format!("Error: {}", err));
            }
        }
    }

    pub async fn submit_query(&mut self) {
        let query = self.query_input.trim().to_string();
        if query.is_empty() {
            self.query = QueryState::Failed("Please enter a query".to_string());
            return;
        }
        self.query = match self.api.submit_query(&query).await {
            Ok(summary) => QueryState::Answered(summary),
            Err(err) => {
                error!(%err, "error submitting query");
                QueryState::Failed(err.to_string())
            }
        };
    }

    /// Returns `true` when the app should exit.
    pub async fn handle_input(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Tab => self.switch_tab(self.tab.next()).await,
                KeyCode::BackTab => self.switch_tab(self.tab.previous()).await,
                KeyCode::Char(c @ '1'..='4') => {
                    let index = c as usize - '1' as usize;
                    self.switch_tab(RecordKind::ALL[index]).await;
                }
                KeyCode::Char('r') => self.refresh().await,
                KeyCode::Char('/') => {
                    self.filter_input = self.filter.to_string();
                    self.status_line = None;
                    self.input_mode = InputMode::Filter;
                }
                KeyCode::Char('c') => self.clear_filter().await,
                KeyCode::Char('a') => {
                    self.note_input.clear();
                    self.status_line = None;
                    self.input_mode = InputMode::Note;
                }
                KeyCode::Char('?') => {
                    self.query_input.clear();
                    self.query = QueryState::Idle;
                    self.input_mode = InputMode::Query;
                }
                KeyCode::Enter => self.open_detail().await,
                _ => {}
            },

            InputMode::Note => match key.code {
                KeyCode::Enter => self.submit_note().await,
                KeyCode::Esc => {
                    self.note_input.clear();
                    self.input_mode = InputMode::Normal;
                }
                KeyCode::Char(c) => self.note_input.push(c),
                KeyCode::Backspace => {
                    self.note_input.pop();
                }
                _ => {}
            },

            InputMode::Filter => match key.code {
                KeyCode::Enter => self.apply_filter_input().await,
                KeyCode::Esc => {
                    self.status_line = None;
                    self.input_mode = InputMode::Normal;
                }
                KeyCode::Char(c) => self.filter_input.push(c),
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                _ => {}
            },

            InputMode::Query => match key.code {
                KeyCode::Enter => self.submit_query().await,
                KeyCode::Esc => self.input_mode = InputMode::Normal,
                KeyCode::Char(c) => self.query_input.push(c),
                KeyCode::Backspace => {
                    self.query_input.pop();
                }
                _ => {}
            },

            InputMode::Detail => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                    self.detail = None;
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Todo;

    fn app() -> App {
        App::new(ApiClient::new("http://127.0.0.1:9"), 50)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn todos() -> Records {
        Records::Todos(vec![
            Todo::new(1, "plan trip"),
            Todo::new(2, "book flights").with_parent(1),
            Todo::new(3, "stray").with_parent(99),
        ])
    }

    #[test]
    fn test_todos_become_a_forest() {
        let mut app = app();
        app.set_records(todos());

        match &app.content {
            TabContent::Todos(forest) => {
                assert_eq!(forest.len(), 2);
                assert_eq!(forest[0].children[0].todo.id, 2);
            }
            other => panic!("unexpected content: {:?}", other),
        }
        assert_eq!(app.content.len(), 3);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_selection_follows_flattened_rows() {
        let mut app = app();
        app.set_records(todos());
        assert_eq!(app.selected_id(), Some(1));
        app.next();
        assert_eq!(app.selected_id(), Some(2));
        app.next();
        assert_eq!(app.selected_id(), Some(3));
        app.next();
        assert_eq!(app.selected_id(), Some(1));
        app.previous();
        assert_eq!(app.selected_id(), Some(3));
    }

    #[test]
    fn test_empty_list_has_no_selection() {
        let mut app = app();
        app.set_records(Records::Notes(Vec::new()));
        assert_eq!(app.state.selected(), None);
        app.next();
        app.previous();
        assert_eq!(app.selected_id(), None);
    }

    #[test]
    fn test_cyclic_batch_is_reported() {
        let mut app = app();
        app.set_records(Records::Todos(vec![Todo::new(1, "a").with_parent(1)]));
        assert!(matches!(app.content, TabContent::Failed(ref msg) if msg.contains("cycle")));
        assert_eq!(app.state.selected(), None);
    }

    #[test]
    fn test_curiosities_keep_backend_order() {
        let mut app = app();
        let curiosities: Vec<Curiosity> = serde_json::from_value(serde_json::json!([
            {"id": 1, "curiosity_text": "oldest"},
            {"id": 2, "curiosity_text": "newest"}
        ]))
        .unwrap();
        app.set_records(Records::Curiosities(curiosities));
        assert_eq!(app.content.id_at(0), Some(1));
        assert_eq!(app.content.id_at(1), Some(2));
    }

    #[test]
    fn test_select_tab_resets_content() {
        let mut app = app();
        app.set_records(todos());
        app.select_tab(RecordKind::Actions);
        assert_eq!(app.tab, RecordKind::Actions);
        assert_eq!(app.content, TabContent::Loading);
        assert_eq!(app.state.selected(), None);
    }

    #[tokio::test]
    async fn test_typing_in_note_mode() {
        let mut app = app();
        assert!(!app.handle_input(key(KeyCode::Char('a'))).await);
        assert_eq!(app.input_mode, InputMode::Note);
        for c in "hi!".chars() {
            app.handle_input(key(KeyCode::Char(c))).await;
        }
        app.handle_input(key(KeyCode::Backspace)).await;
        assert_eq!(app.note_input, "hi");
        // 'q' is text here, not quit
        assert!(!app.handle_input(key(KeyCode::Char('q'))).await);
        app.handle_input(key(KeyCode::Esc)).await;
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.note_input.is_empty());
    }

    #[tokio::test]
    async fn test_blank_note_is_not_sent() {
        let mut app = app();
        app.input_mode = InputMode::Note;
        app.note_input = "   ".to_string();
        app.handle_input(key(KeyCode::Enter)).await;
        assert_eq!(app.status_line.as_deref(), Some("Please enter a note"));
        assert_eq!(app.input_mode, InputMode::Note);
    }

    #[tokio::test]
    async fn test_blank_query_is_not_sent() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('?'))).await;
        assert_eq!(app.input_mode, InputMode::Query);
        app.handle_input(key(KeyCode::Enter)).await;
        assert_eq!(app.query, QueryState::Failed("Please enter a query".to_string()));
    }

    #[tokio::test]
    async fn test_bad_filter_keeps_popup_open() {
        let mut app = app();
        app.handle_input(key(KeyCode::Char('/'))).await;
        assert_eq!(app.input_mode, InputMode::Filter);
        for c in "after:someday".chars() {
            app.handle_input(key(KeyCode::Char(c))).await;
        }
        app.handle_input(key(KeyCode::Enter)).await;
        assert_eq!(app.input_mode, InputMode::Filter);
        assert!(app.status_line.as_deref().unwrap_or_default().contains("someday"));
        assert!(app.filter.is_default());
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = app();
        assert!(app.handle_input(key(KeyCode::Char('q'))).await);
        app.input_mode = InputMode::Query;
        assert!(
            app.handle_input(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
                .await
        );
    }
}
