use crate::app::{App, InputMode, QueryState, TabContent};
use crate::format::{
    action_text, category_name, format_datetime, format_paragraph, note_status, pad_id,
    todo_details, todo_heading,
};
use crate::models::{Action, Curiosity, Note, RecordKind};
use crate::tree::{flatten, TreeRow};
use chrono::{DateTime, Utc};
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

const PARAGRAPH_WIDTH: usize = 75;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn key_hint(key: &'static str, label: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Red)),
        Span::raw(label),
    ]
}

fn get_legend(input_mode: InputMode) -> Text<'static> {
    let hints: Vec<[Span<'static>; 2]> = match input_mode {
        InputMode::Normal => vec![
            key_hint(" q ", ": Quit "),
            key_hint(" j/k ", ": Move "),
            key_hint(" Tab/1-4 ", ": Switch Tab "),
            key_hint(" Enter ", ": Details "),
            key_hint(" r ", ": Refresh "),
            key_hint(" / ", ": Filter "),
            key_hint(" c ", ": Clear Filter "),
            key_hint(" a ", ": Add Note "),
            key_hint(" ? ", ": Query "),
        ],
        InputMode::Note | InputMode::Filter | InputMode::Query => vec![
            key_hint(" Enter ", ": Submit "),
            key_hint(" Esc ", ": Cancel "),
        ],
        InputMode::Detail => vec![key_hint(" Esc ", ": Close ")],
    };
    Text::from(Line::from(hints.into_iter().flatten().collect::<Vec<_>>()))
}

fn checkbox(complete: bool, cancelled: bool) -> &'static str {
    if complete {
        "[x]"
    } else if cancelled {
        "[-]"
    } else {
        "[ ]"
    }
}

fn tree_prefix(row: &TreeRow<'_>) -> String {
    if row.depth == 0 {
        return String::new();
    }
    let branch = if row.is_last { "└─ " } else { "├─ " };
    format!("{}{}", "   ".repeat(row.depth - 1), branch)
}

/// Heading line of a todo, coloured by its status at `now`.
pub fn todo_line(row: &TreeRow<'_>, now: DateTime<Utc>) -> Line<'static> {
    let status = row.todo.status(now);
    let mut line = Line::from(vec![
        Span::raw(tree_prefix(row)),
        Span::raw(format!("{} ", checkbox(row.todo.complete, row.todo.cancelled))),
        Span::raw(todo_heading(row.todo)),
        Span::styled(
            format!("  ({})", status),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);
    line.style = Style::default().fg(status.color());
    line
}

fn todo_item(row: &TreeRow<'_>, now: DateTime<Utc>) -> ListItem<'static> {
    let mut lines = vec![todo_line(row, now)];
    let details = todo_details(row.todo);
    if !details.is_empty() {
        let indent = " ".repeat(tree_prefix(row).chars().count() + 4);
        let mut line = Line::from(format!("{}{}", indent, details));
        line.style = Style::default().fg(row.todo.status(now).color());
        lines.push(line);
    }
    ListItem::new(Text::from(lines))
}

fn note_item(note: &Note) -> ListItem<'static> {
    let mut lines = vec![Line::from(vec![
        Span::styled(pad_id(note.id), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {} ", format_datetime(note.timestamp))),
        Span::styled(
            category_name(note).to_string(),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("  {}", note_status(note)),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ])];
    if !note.processing_error.is_empty() {
        lines.push(Line::styled(
            format!("    Error: {}", note.processing_error),
            Style::default().fg(Color::Red),
        ));
    }
    lines.extend(
        format_paragraph(note.display_text(), PARAGRAPH_WIDTH, 1)
            .into_iter()
            .map(Line::from),
    );
    ListItem::new(Text::from(lines))
}

fn action_item(action: &Action) -> ListItem<'static> {
    let color = if action.mark_complete {
        Color::Green
    } else {
        Color::Reset
    };
    let mut line = Line::from(vec![
        Span::styled(pad_id(action.id), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {} ", format_datetime(action.timestamp))),
        Span::raw(action_text(action)),
    ]);
    line.style = Style::default().fg(color);
    ListItem::new(line)
}

fn curiosity_item(curiosity: &Curiosity) -> ListItem<'static> {
    let note = curiosity.note.as_ref();
    let mut lines = vec![Line::styled(
        format_datetime(note.and_then(|n| n.timestamp)),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(note) = note {
        lines.extend(
            format_paragraph(&note.note_text, PARAGRAPH_WIDTH, 0)
                .into_iter()
                .map(|text| Line::styled(text, Style::default().add_modifier(Modifier::DIM))),
        );
    }
    lines.extend(
        format_paragraph(&curiosity.curiosity_text, PARAGRAPH_WIDTH, 1)
            .into_iter()
            .map(Line::from),
    );
    ListItem::new(Text::from(lines))
}

fn list_items(content: &TabContent, tab: RecordKind, now: DateTime<Utc>) -> Vec<ListItem<'static>> {
    let items: Vec<ListItem<'static>> = match content {
        TabContent::Loading => return vec![ListItem::new("Loading...")],
        TabContent::Failed(message) => {
            return vec![ListItem::new(Line::styled(
                format!("Error: {}", message),
                Style::default().fg(Color::Red),
            ))]
        }
        TabContent::Notes(notes) => notes.iter().map(note_item).collect(),
        TabContent::Todos(forest) => flatten(forest)
            .iter()
            .map(|row| todo_item(row, now))
            .collect(),
        TabContent::Actions(actions) => actions.iter().map(action_item).collect(),
        TabContent::Curiosities(curiosities) => curiosities.iter().map(curiosity_item).collect(),
    };
    if items.is_empty() {
        vec![ListItem::new(format!("No {} found", tab.path()))]
    } else {
        items
    }
}

fn input_popup(f: &mut Frame, area: Rect, title: &str, input: &str, footer: Vec<Line<'static>>) {
    let popup_width = (area.width / 10 * 6).max(20).min(area.width);
    let inner_width = popup_width.saturating_sub(2).max(1);
    let input_lines = std::cmp::max(calculate_wrapped_lines(input, inner_width), 1) as u16;
    let popup_height = std::cmp::min(input_lines + footer.len() as u16 + 2, area.height);
    let popup_area = centered_rect_absolute(popup_width, popup_height, area);

    let mut lines = vec![Line::styled(
        input.to_string(),
        Style::default().fg(Color::White),
    )];
    lines.extend(footer);

    let popup = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

fn query_footer(query: &QueryState) -> Vec<Line<'static>> {
    match query {
        QueryState::Idle => Vec::new(),
        QueryState::Failed(message) => vec![
            Line::from(""),
            Line::styled(format!("Error: {}", message), Style::default().fg(Color::Red)),
        ],
        QueryState::Answered(summary) => {
            let mut lines = vec![Line::from("")];
            let title = summary.title.clone().unwrap_or_else(|| "Response:".to_string());
            lines.push(Line::styled(title, Style::default().add_modifier(Modifier::BOLD)));
            lines.extend(
                summary
                    .summary
                    .iter()
                    .map(|chunk| Line::styled(chunk.clone(), Style::default().fg(Color::White))),
            );
            lines
        }
    }
}

/// Renders one frame. `now` is read once by the caller so every todo in
/// the frame is classified against the same instant.
pub fn draw(f: &mut Frame, app: &mut App, now: DateTime<Utc>) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    // Tabs
    let titles: Vec<String> = RecordKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| format!("{} {}", i + 1, kind.title()))
        .collect();
    let selected_tab = RecordKind::ALL
        .iter()
        .position(|kind| *kind == app.tab)
        .unwrap_or_default();
    let tabs = Tabs::new(titles)
        .select(selected_tab)
        .block(Block::default().borders(Borders::ALL).title(app.api.base_url().to_string()))
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[0]);

    // Records
    let list_title = if app.filter.is_default() {
        app.tab.title().to_string()
    } else {
        format!("{} (filter: {})", app.tab.title(), app.filter)
    };
    let list = List::new(list_items(&app.content, app.tab, now))
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, chunks[1], &mut app.state);

    // Status line
    if let Some(status) = &app.status_line {
        let style = if status.starts_with("Error") {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        f.render_widget(Paragraph::new(status.clone()).style(style), chunks[2]);
    }

    match app.input_mode {
        InputMode::Normal => {}
        InputMode::Note => input_popup(
            f,
            chunks[1],
            "New Note (Press Enter to Submit)",
            &app.note_input,
            Vec::new(),
        ),
        InputMode::Filter => input_popup(
            f,
            chunks[1],
            "Filter",
            &app.filter_input,
            vec![Line::styled(
                "words  after:DATE  before:DATE  +/-completed +/-cancelled +/-active +/-applied +/-unapplied",
                Style::default().add_modifier(Modifier::DIM),
            )],
        ),
        InputMode::Query => input_popup(
            f,
            chunks[1],
            "Query",
            &app.query_input,
            query_footer(&app.query),
        ),
        InputMode::Detail => {
            let body = app
                .detail
                .as_ref()
                .map(|detail| {
                    serde_json::to_string_pretty(detail).unwrap_or_else(|_| detail.to_string())
                })
                .unwrap_or_default();
            let popup_area = centered_rect_absolute(
                chunks[1].width / 10 * 8,
                chunks[1].height / 10 * 9,
                chunks[1],
            );
            let popup = Paragraph::new(body)
                .block(
                    Block::default()
                        .title(format!("{} Details", app.tab.title()))
                        .borders(Borders::ALL),
                )
                .wrap(Wrap { trim: false });
            f.render_widget(Clear, popup_area);
            f.render_widget(popup, popup_area);
        }
    }

    // Render the legend in the footer
    let legend = Paragraph::new(get_legend(app.input_mode))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(legend, chunks[3]);
}

pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> io::Result<()> {
    app.refresh().await;
    loop {
        terminal.draw(|f| draw(f, &mut app, Utc::now()))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_input(key).await {
                    return Ok(());
                }
            }
        }
    }
}

fn calculate_wrapped_lines(text: &str, max_width: u16) -> usize {
    let max_width = max_width.max(1) as usize;
    let mut line_count = 0;
    for line in text.lines() {
        let line_width = line.chars().count();
        line_count += std::cmp::max(line_width.div_ceil(max_width), 1);
    }
    line_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::models::{Records, Todo};
    use chrono::TimeZone;
    use ratatui::backend::TestBackend;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, app, now())).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_late_todo_line_is_red() {
        let mut todo = Todo::new(5, "renew passport");
        todo.target_end_time = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let row = TreeRow {
            todo: &todo,
            depth: 0,
            is_last: true,
        };
        let line = todo_line(&row, now());
        assert_eq!(line.style.fg, Some(Color::Red));
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, "[ ] [0005]: renew passport  (late)");
    }

    #[test]
    fn test_child_rows_get_a_branch() {
        let todo = Todo::new(2, "child");
        let row = TreeRow {
            todo: &todo,
            depth: 2,
            is_last: true,
        };
        assert_eq!(tree_prefix(&row), "   └─ ");
    }

    #[test]
    fn test_todo_tree_renders() {
        let mut app = App::new(ApiClient::new("http://127.0.0.1:9"), 50);
        app.select_tab(RecordKind::Todos);
        app.set_records(Records::Todos(vec![
            Todo::new(1, "plan trip"),
            Todo::new(2, "book flights").with_parent(1),
        ]));
        let screen = screen(&mut app);
        assert!(screen.contains("[0001]: plan trip"));
        assert!(screen.contains("└─ [ ] [0002]: book flights"));
    }

    #[test]
    fn test_empty_tab_message() {
        let mut app = App::new(ApiClient::new("http://127.0.0.1:9"), 50);
        app.select_tab(RecordKind::Actions);
        app.set_records(Records::Actions(Vec::new()));
        assert!(screen(&mut app).contains("No actions found"));
    }

    #[test]
    fn test_wrapped_line_count() {
        assert_eq!(calculate_wrapped_lines("", 10), 0);
        assert_eq!(calculate_wrapped_lines("abcdefghijk", 10), 2);
        assert_eq!(calculate_wrapped_lines("a\n\nb", 10), 3);
    }
}
