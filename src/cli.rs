use crate::api::ApiClient;
use crate::app::App;
use crate::config::Config;
use crate::error::AppError;
use crate::filter::FilterValues;
use crate::format::{todo_details, todo_heading};
use crate::status::TodoStatus;
use crate::tree::{build_forest, flatten, TodoNode};
use crate::ui::run_app;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Parser, Debug)]
#[command(
    name = "planner",
    version,
    about = "Terminal client for the planner notes and todos backend"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file to read instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides config and PLANNER_URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Print the todo tree
    Todos(TodosArgs),
    /// Create a note
    Note {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Ask the summarizer a question about your notes
    Query {
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    /// Show the active notebook, or switch to another one
    Notebook {
        name: Option<String>,

        /// Create the notebook before switching to it
        #[arg(long, requires = "name")]
        create: bool,
    },
}

#[derive(Args, Debug)]
pub struct TodosArgs {
    /// Include completed and cancelled todos
    #[arg(long)]
    pub all: bool,

    /// Only print todos with this status (new, scheduled, started, late, complete, cancelled)
    #[arg(long)]
    pub status: Option<String>,

    /// Search text passed to the backend
    #[arg(long)]
    pub search: Option<String>,
}

pub async fn run() -> Result<(), AppError> {
    dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env()?;
    if let Some(url) = &cli.url {
        config.instance_url = url.clone();
    }
    config.validate()?;

    let command = cli.command.unwrap_or(Commands::Tui);
    let log_file = matches!(command, Commands::Tui).then(|| config.log_path());
    init_tracing(&cli.log_level, log_file.as_deref())?;
    info!(url = %config.instance_url, "starting planner");

    let api = ApiClient::new(&config.instance_url);
    match command {
        Commands::Tui => run_tui(App::new(api, config.limit)).await,
        Commands::Todos(args) => print_todos(&api, config.limit, args).await,
        Commands::Note { text } => {
            let note = api.create_note(text.join(" ").trim()).await?;
            println!("Created note {}", note.id);
            Ok(())
        }
        Commands::Query { prompt } => {
            let summary = api.submit_query(&prompt.join(" ")).await?;
            if let Some(title) = summary.title {
                println!("{}\n", title);
            }
            for chunk in summary.summary {
                println!("{}", chunk);
            }
            Ok(())
        }
        Commands::Notebook {
            name: Some(name),
            create,
        } => {
            if create {
                let created = api.create_notebook(&name).await?;
                println!("Created notebook {}", created);
            }
            let active = api.set_active_notebook(&name).await?;
            println!("Active notebook: {}", active);
            Ok(())
        }
        Commands::Notebook { name: None, .. } => {
            let active = api.active_notebook().await?;
            for notebook in api.list_notebooks().await? {
                let marker = if notebook == active { "*" } else { " " };
                println!("{} {}", marker, notebook);
            }
            Ok(())
        }
    }
}

async fn run_tui(app: App) -> Result<(), AppError> {
    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(AppError::from)
}

async fn print_todos(api: &ApiClient, limit: usize, args: TodosArgs) -> Result<(), AppError> {
    let only = args
        .status
        .as_deref()
        .map(str::parse::<TodoStatus>)
        .transpose()?;

    let mut filter = FilterValues::default();
    if args.all {
        filter.todos.completed = true;
        filter.todos.cancelled = true;
    }
    filter.search = args.search.unwrap_or_default();

    let todos = api.fetch_todos(&filter, limit).await?;
    let forest = build_forest(todos)?;
    print!("{}", todo_report(&forest, Utc::now(), only));
    Ok(())
}

/// Plain-text rendering of a forest, one todo per line with its details
/// indented beneath. `now` is shared by every row.
pub fn todo_report(forest: &[TodoNode], now: DateTime<Utc>, only: Option<TodoStatus>) -> String {
    let mut out = String::new();
    for row in flatten(forest) {
        let status = row.todo.status(now);
        if only.is_some_and(|wanted| wanted != status) {
            continue;
        }
        let indent = "    ".repeat(row.depth);
        out.push_str(&format!("{}{} ({})\n", indent, todo_heading(row.todo), status));
        let details = todo_details(row.todo);
        if !details.is_empty() {
            out.push_str(&format!("{}    {}\n", indent, details));
        }
    }
    if out.is_empty() {
        out.push_str("No todos found\n");
    }
    out
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<(), AppError> {
    let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(env_filter);
    let result = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };
    result.map_err(|err| AppError::Logging(err.to_string()))
}
