// main.rs

use planner_tui::cli;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(err) = cli::run().await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
