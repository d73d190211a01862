use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use daybook_core::dates::{date_key, month_grid, week_days};
use daybook_core::task::Task;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Day,
    Week,
    Month,
}

/// One date bucket in display order, limited to the active profile.
pub(crate) fn visible_bucket(app: &App, date: Option<&str>) -> Vec<Task> {
    let profile = app.scheduler.active_profile();
    app.scheduler
        .bucket(date)
        .into_iter()
        .filter(|t| profile.is_none() || t.project_id == profile)
        .collect()
}

fn day_heading(day: NaiveDate, today: NaiveDate) -> String {
    let label = day.format("%a %b %-d").to_string();
    if day == today {
        format!("{} {}", label.bold().green(), "(today)".dimmed())
    } else {
        label.bold().to_string()
    }
}

fn print_day(app: &App, day: NaiveDate, today: NaiveDate, show_empty: bool) -> bool {
    let tasks = visible_bucket(app, Some(&date_key(day)));
    if tasks.is_empty() && !show_empty {
        return false;
    }

    println!("{}", day_heading(day, today));
    if tasks.is_empty() {
        println!("   {}", "Nothing planned".dimmed());
    }
    for task in &tasks {
        println!("   {}", task.render());
    }
    true
}

pub fn run(app: &App, view: View, date: Option<&str>, json: bool) -> Result<()> {
    let today = app.today();
    let anchor = match date {
        Some(input) => app.parse_day(input)?,
        None => today,
    };
    let week_start = app.scheduler.preferences().week_start;

    let days: Vec<NaiveDate> = match view {
        View::Day => vec![anchor],
        View::Week => week_days(anchor, week_start),
        View::Month => month_grid(anchor, week_start)
            .into_iter()
            .flatten()
            .filter(|d| d.month() == anchor.month())
            .collect(),
    };

    if json {
        let by_day: BTreeMap<String, Vec<Task>> = days
            .iter()
            .map(|d| (date_key(*d), visible_bucket(app, Some(&date_key(*d)))))
            .collect();
        println!("{}", serde_json::to_string_pretty(&by_day)?);
        return Ok(());
    }

    match view {
        View::Day => {
            print_day(app, anchor, today, true);
        }
        View::Week => {
            for (i, day) in days.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_day(app, *day, today, true);
            }
        }
        View::Month => {
            print_month_grid(app, anchor, today);
            for day in &days {
                // Only days with something on them get a listing.
                if !visible_bucket(app, Some(&date_key(*day))).is_empty() {
                    println!();
                    print_day(app, *day, today, false);
                }
            }
        }
    }

    Ok(())
}

fn print_month_grid(app: &App, anchor: NaiveDate, today: NaiveDate) {
    let week_start = app.scheduler.preferences().week_start;
    let grid = month_grid(anchor, week_start);

    println!("{}", anchor.format("%B %Y").to_string().bold());
    if let Some(first_row) = grid.first() {
        let header: Vec<String> = first_row
            .iter()
            .map(|d| format!("{:>4}", &d.format("%a").to_string()[..2]))
            .collect();
        println!("{}", header.join("").dimmed());
    }

    for row in &grid {
        let cells: Vec<String> = row
            .iter()
            .map(|day| {
                if day.month() != anchor.month() {
                    return "    ".to_string();
                }
                let open = visible_bucket(app, Some(&date_key(*day)))
                    .iter()
                    .filter(|t| !t.completed)
                    .count();
                let marker = if open > 0 { "*" } else { " " };
                let cell = format!("{:>3}{}", day.day(), marker);
                if *day == today {
                    cell.green().bold().to_string()
                } else {
                    cell
                }
            })
            .collect();
        println!("{}", cells.join(""));
    }
}

pub fn inbox(app: &App) -> Result<()> {
    let tasks = visible_bucket(app, None);
    println!("{}", "Inbox".bold());
    if tasks.is_empty() {
        println!("   {}", "Empty".dimmed());
    }
    for task in &tasks {
        println!("   {}", task.render());
    }
    Ok(())
}
