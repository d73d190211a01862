use anyhow::Result;
use clap::Subcommand;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

const DEFAULT_PROFILE_COLOR: &str = "#6366f1";

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Create a profile
    Add {
        name: String,

        /// Color as #rrggbb
        #[arg(short, long, default_value = DEFAULT_PROFILE_COLOR)]
        color: String,
    },
    /// List profiles
    List,
    /// Filter views to a profile; clears the filter when omitted
    Use { profile: Option<String> },
    /// Delete a profile (its tasks are kept, untagged)
    Rm { profile: String },
}

pub fn run(app: &App, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Add { name, color } => {
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("Profile name cannot be empty");
            }
            let profile = app.scheduler.add_profile(name, &color);
            println!("{} {}", "Created".green(), profile.render());
        }
        ProfileAction::List => {
            let profiles = app.scheduler.profiles();
            if profiles.is_empty() {
                println!("{}", "No profiles. Create one with `daybook profile add <name>`".dimmed());
            }
            let active = app.scheduler.active_profile();
            for profile in &profiles {
                let marker = if active.as_deref() == Some(profile.id.as_str()) {
                    "*".green().to_string()
                } else {
                    " ".to_string()
                };
                println!("{} {}", marker, profile.render());
            }
        }
        ProfileAction::Use { profile: None } => {
            app.scheduler.set_active_profile(None);
            println!("Showing all profiles");
        }
        ProfileAction::Use { profile: Some(reference) } => {
            let profile = app.find_profile(&reference)?;
            app.scheduler.set_active_profile(Some(&profile.id));
            println!("Showing {}", profile.name.bold());
        }
        ProfileAction::Rm { profile } => {
            let profile = app.find_profile(&profile)?;
            app.scheduler.remove_profile(&profile.id);
            println!("{} {}", "Deleted".red(), profile.name);
        }
    }
    Ok(())
}
