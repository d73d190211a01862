use anyhow::{Context, Result};
use daybook_core::remote::{RestStore, load_remote};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::utils::tui;

/// Replace local tasks and projects with the remote store's rows.
pub async fn run(app: &App) -> Result<()> {
    let remote = app
        .config
        .remote
        .as_ref()
        .context("No [remote] store is configured")?;
    let store = RestStore::new(remote);

    // Queued writes land first so the snapshot includes them.
    app.scheduler.flush().await;

    let spinner = tui::create_spinner(format!("Loading from {}", remote.url));
    let result = load_remote(&store).await;
    spinner.finish_and_clear();

    let (tasks, projects) = result?;
    let (task_count, project_count) = (tasks.len(), projects.len());
    app.scheduler.hydrate(tasks, projects);

    println!(
        "{} {} tasks, {} projects",
        "Restored".green(),
        task_count,
        project_count
    );
    Ok(())
}
