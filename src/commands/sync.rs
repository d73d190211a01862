use anyhow::Result;
use daybook_core::constants::BACKGROUND_SYNC_INTERVAL;
use daybook_core::sync::{BackgroundSync, full_sync};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;
use crate::utils::tui;

pub async fn run(app: &App, background: bool) -> Result<()> {
    let calendar = app.google_calendar().await?;
    let calendar_id = app.calendar_id();

    let mut config = app.scheduler.preferences().sync;
    config.time_zone = app.sync_time_zone();
    let today = app.today();

    let spinner = tui::create_spinner(format!("Syncing with {}", calendar_id));
    let result = if background {
        let gate = BackgroundSync::resume(BACKGROUND_SYNC_INTERVAL, app.store.last_sync());
        gate.run(&app.scheduler, &calendar, &calendar_id, &config, today).await
    } else {
        Some(full_sync(&app.scheduler, &calendar, &calendar_id, &config, today).await)
    };
    spinner.finish_and_clear();

    let Some(result) = result else {
        tracing::info!("skipping sync; the last one was less than a minute ago");
        return Ok(());
    };

    println!("📅 {}", calendar_id);
    match result {
        Ok(report) => {
            println!("{}", report.render());
            if !report.is_clean() {
                anyhow::bail!("Sync finished with {} error(s)", report.errors.len());
            }
            Ok(())
        }
        Err(e) if e.is_auth_failure() => {
            println!("   {}", e.to_string().red());
            anyhow::bail!("Run `daybook auth google` to reconnect")
        }
        Err(e) => Err(e.into()),
    }
}
