use anyhow::Result;
use console::style;

use crate::core::config::AppConfig;
use crate::core::memory::{HistoryStore, TaskStore};
use crate::core::terminal::{self, print_status, print_success};

/// Create both databases and their tables. Safe to run repeatedly.
pub async fn run_init_db(config: &AppConfig) -> Result<()> {
    terminal::print_banner();
    println!("  {}\n", style("Initializing databases...").bold());

    TaskStore::open(&config.storage.tasks_db_path)?;
    print_status("Tasks", &config.storage.tasks_db_path.display().to_string());
    HistoryStore::open(&config.storage.history_db_path)?;
    print_status(
        "History",
        &config.storage.history_db_path.display().to_string(),
    );

    print_success("Databases ready.");
    Ok(())
}
