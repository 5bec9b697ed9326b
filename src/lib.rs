pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod models;
pub mod parser;
pub mod status;
pub mod tree;
pub mod ui;

pub use status::{classify, TodoStatus};
pub use tree::{build_forest, TodoNode, TreeError};
