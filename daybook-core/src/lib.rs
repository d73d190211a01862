//! Core of the daybook planner.
//!
//! This crate owns everything below the presentation layer:
//! - `scheduler` holds tasks, projects and profiles and implements ordering,
//!   completion with auto-trash, undo and profiles
//! - `store` persists state locally, `remote` and `mirror` replicate it to a
//!   hosted row store
//! - `calendar` and `sync` reconcile tasks with an external calendar
//! - `modules` derives the side-panel task lists

pub mod activity;
pub mod calendar;
pub mod constants;
pub mod dates;
pub mod error;
pub mod mirror;
pub mod modules;
pub mod ordering;
pub mod remote;
pub mod scheduler;
pub mod settings;
pub mod store;
pub mod sync;
pub mod task;

#[cfg(test)]
mod testing;

pub use error::{DaybookError, DaybookResult};
pub use scheduler::Scheduler;
pub use task::{Profile, Project, Subtask, Task, TaskDraft, TaskPatch, TimeSlot};
