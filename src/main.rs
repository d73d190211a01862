mod app;
mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use app::App;

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "Plan tasks by day, week and month, and sync them with your calendar")]
struct Cli {
    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        title: String,

        /// Day to schedule it on: YYYY-MM-DD, "today", "tomorrow" or +N/-N days (inbox when omitted)
        #[arg(short, long)]
        date: Option<String>,

        /// Time slot, e.g. "09:00-10:30"
        #[arg(short, long)]
        time: Option<String>,

        /// Last day of a multi-day task
        #[arg(long)]
        until: Option<String>,

        /// Repeat: daily, weekly, monthly or yearly
        #[arg(short, long)]
        repeat: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,

        /// Profile to file it under (defaults to the active profile)
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// Show a day, week or month
    Show {
        #[arg(value_enum, default_value_t = commands::show::View::Day)]
        view: commands::show::View,

        /// Any day inside the period (defaults to today)
        date: Option<String>,

        /// Print tasks as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// List undated tasks
    Inbox,
    /// Move a task to another day and/or position
    Move {
        /// Task id (or a unique prefix)
        task: String,

        /// Target day; "inbox" unschedules it
        to: String,

        /// Row in the target day as `show` lists it, starting at 1 (end of the list when omitted)
        #[arg(short, long)]
        position: Option<usize>,
    },
    /// Toggle a task's completion
    Done { task: String },
    /// Change a task
    Edit {
        task: String,

        #[arg(long)]
        title: Option<String>,

        /// Time slot, e.g. "09:00-10:30", or "none" to clear it
        #[arg(short, long)]
        time: Option<String>,

        /// Notes, or "" to clear them
        #[arg(short, long)]
        notes: Option<String>,

        /// Profile id or name, or "none"
        #[arg(short, long)]
        profile: Option<String>,

        /// Color as #rrggbb, or "none"
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Delete a task
    Rm { task: String },
    /// Manage a task's checklist
    Subtask {
        #[command(subcommand)]
        action: commands::tasks::SubtaskAction,
    },
    /// Show a side-panel module (overdue, inbox, upcoming, ...)
    Module {
        /// Module id; lists the layout when omitted
        kind: Option<String>,

        /// Add or remove the module from the layout
        #[arg(long)]
        toggle: bool,
    },
    /// Show recent activity
    Log {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Undo an activity entry (the latest one when omitted)
    Undo { entry: Option<String> },
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Show or change preferences
    Prefs {
        /// Preference to set, e.g. auto-trash
        key: Option<String>,
        value: Option<String>,
    },
    /// Connect a calendar account
    Auth {
        /// Provider to authenticate with (only "google")
        provider: String,
    },
    /// List the connected account's calendars
    Calendars,
    /// Sync tasks with the connected calendar
    Sync {
        /// Skip if the last automatic sync was less than a minute ago
        #[arg(long)]
        background: bool,
    },
    /// Replace local tasks with the remote store's copy
    Restore,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info,daybook=debug,daybook_core=debug,daybook_provider_google=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,daybook=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let app = App::open()?;

    let result = match cli.command {
        Commands::Add {
            title,
            date,
            time,
            until,
            repeat,
            notes,
            profile,
        } => commands::add::run(
            &app,
            commands::add::AddArgs {
                title,
                date,
                time,
                until,
                repeat,
                notes,
                profile,
            },
        ),
        Commands::Show { view, date, json } => commands::show::run(&app, view, date.as_deref(), json),
        Commands::Inbox => commands::show::inbox(&app),
        Commands::Move { task, to, position } => commands::tasks::move_task(&app, &task, &to, position),
        Commands::Done { task } => commands::tasks::done(&app, &task),
        Commands::Edit {
            task,
            title,
            time,
            notes,
            profile,
            color,
        } => commands::tasks::edit(
            &app,
            &task,
            commands::tasks::EditArgs {
                title,
                time,
                notes,
                profile,
                color,
            },
        ),
        Commands::Rm { task } => commands::tasks::remove(&app, &task),
        Commands::Subtask { action } => commands::tasks::subtask(&app, action),
        Commands::Module { kind, toggle } => commands::module::run(&app, kind.as_deref(), toggle),
        Commands::Log { limit } => commands::log::run(&app, limit),
        Commands::Undo { entry } => commands::log::undo(&app, entry.as_deref()),
        Commands::Profile { action } => commands::profile::run(&app, action),
        Commands::Prefs { key, value } => commands::prefs::run(&app, key.as_deref(), value.as_deref()),
        Commands::Auth { provider } => commands::auth::run(&app, &provider).await,
        Commands::Calendars => commands::calendars::run(&app).await,
        Commands::Sync { background } => commands::sync::run(&app, background).await,
        Commands::Restore => commands::restore::run(&app).await,
    };

    // Let auto-trash timers fire and queued remote writes land before exit.
    app.scheduler.settle().await;

    result
}
