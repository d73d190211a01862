use anyhow::Result;
use daybook_core::modules::{self, ModuleContext, ModuleKind};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

pub fn run(app: &App, kind: Option<&str>, toggle: bool) -> Result<()> {
    let Some(id) = kind else {
        return list(app);
    };
    let kind = ModuleKind::from_id(id).ok_or_else(|| {
        let known: Vec<&str> = ModuleKind::ALL.iter().map(|k| k.id()).collect();
        anyhow::anyhow!("Unknown module '{}'. Known modules: {}", id, known.join(", "))
    })?;

    if toggle {
        let mut layout = app.store.module_layout();
        layout.toggle(kind);
        app.store.save_module_layout(&layout)?;
        let state = if layout.modules.contains(&kind) { "shown" } else { "hidden" };
        println!("{} {}", modules::spec(kind).meta.title, state.dimmed());
        return Ok(());
    }

    show(app, kind);
    Ok(())
}

fn show(app: &App, kind: ModuleKind) {
    let meta = modules::spec(kind).meta;
    let active_profile = app.scheduler.active_profile();
    let ctx = ModuleContext {
        today: app.today(),
        active_profile: active_profile.as_deref(),
        external_as_non_tasks: app.scheduler.preferences().external_as_non_tasks,
    };
    let tasks = modules::derive(kind, &app.scheduler.tasks(), &app.scheduler.projects(), &ctx);

    println!("{} {}", meta.icon, meta.title.bold());
    if tasks.is_empty() {
        println!("   {}", "Nothing here".dimmed());
    }
    for task in &tasks {
        match &task.date {
            Some(date) => println!("   {} {}", date.dimmed(), task.render()),
            None => println!("   {}", task.render()),
        }
    }
}

fn list(app: &App) -> Result<()> {
    let layout = app.store.module_layout();
    for kind in ModuleKind::ALL {
        let meta = modules::spec(kind).meta;
        let marker = if layout.modules.contains(&kind) {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        println!("{} {:<10} {}", marker, kind.id(), meta.description.dimmed());
    }
    Ok(())
}
