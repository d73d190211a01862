//! Configuration and user preferences.
//!
//! Two layers:
//! - `AppConfig` is machine setup read from `~/.config/daybook/config.toml`
//!   (plus `DAYBOOK_*` environment overrides): where data lives, the remote
//!   row store, Google OAuth client credentials.
//! - `Preferences` are per-user toggles kept in the local key-value store and
//!   edited from the app itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::dates::{WeekStart, parse_time_zone};
use crate::error::{DaybookError, DaybookResult};
use crate::mirror::RetryPolicy;
use crate::sync::SyncConfig;

static DEFAULT_DATA_DIR: &str = "~/.local/share/daybook";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// IANA zone used to decide what "today" is; system local when unset.
    #[serde(default)]
    pub time_zone: Option<String>,

    #[serde(default)]
    pub remote: Option<RemoteSettings>,

    #[serde(default)]
    pub google: Option<GoogleSettings>,

    #[serde(default)]
    pub mirror: MirrorSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: default_data_dir(),
            time_zone: None,
            remote: None,
            google: None,
            mirror: MirrorSettings::default(),
        }
    }
}

/// PostgREST-style row store the local state is mirrored to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub url: String,
    pub api_key: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    500
}

impl Default for MirrorSettings {
    fn default() -> Self {
        MirrorSettings {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl From<&MirrorSettings> for RetryPolicy {
    fn from(settings: &MirrorSettings) -> Self {
        RetryPolicy {
            max_attempts: settings.max_attempts.max(1),
            backoff: Duration::from_millis(settings.backoff_ms),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> DaybookResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DaybookError::Config("Could not determine config directory".into()))?
            .join("daybook");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file (creating a commented default on first run) and
    /// apply `DAYBOOK_*` environment overrides.
    pub fn load() -> DaybookResult<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            Self::create_default_config(&path)?;
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> DaybookResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("DAYBOOK").separator("__"))
            .build()
            .map_err(|e| DaybookError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| DaybookError::Config(e.to_string()))
    }

    pub fn create_default_config(path: &Path) -> DaybookResult<()> {
        let contents = format!(
            "\
# daybook configuration

# Where tasks, preferences and the activity log are stored:
# data_dir = \"{}\"

# Time zone used to decide what \"today\" is (defaults to the system zone):
# time_zone = \"Europe/Berlin\"

# Mirror every change to a remote row store:
# [remote]
# url = \"https://your-project.example.com/rest/v1\"
# api_key = \"...\"

# Google Calendar sync (create OAuth credentials in the Google Cloud console):
# [google]
# client_id = \"your-client-id.apps.googleusercontent.com\"
# client_secret = \"your-client-secret\"
# calendar_id = \"primary\"
",
            DEFAULT_DATA_DIR
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DaybookError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| DaybookError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned())
    }

    pub fn tz(&self) -> DaybookResult<Option<Tz>> {
        self.time_zone.as_deref().map(parse_time_zone).transpose()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.mirror)
    }
}

/// User-facing toggles persisted in the local store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    /// Delete tasks a few seconds after they are completed.
    pub auto_trash: bool,
    /// List completed tasks after open ones within a day.
    pub move_completed_to_bottom: bool,
    /// Calendar-origin tasks are events, not to-dos (hidden from overdue).
    pub external_as_non_tasks: bool,
    pub week_start: WeekStart,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPreset {
    pub id: String,
    pub label: String,
    pub minutes_before: i64,
}

impl ReminderPreset {
    pub fn defaults() -> Vec<ReminderPreset> {
        [("at-start", "At start", 0), ("10-min", "10 minutes before", 10), ("1-hour", "1 hour before", 60)]
            .into_iter()
            .map(|(id, label, minutes_before)| ReminderPreset {
                id: id.to_string(),
                label: label.to_string(),
                minutes_before,
            })
            .collect()
    }
}
