use std::time::Duration;

/// Delay between completing a task and deleting it when auto-trash is on.
pub const AUTO_TRASH_DELAY: Duration = Duration::from_secs(3);

/// Number of activity entries kept for undo.
pub const ACTIVITY_LOG_LIMIT: usize = 50;

/// Inbound sync window, days before today.
pub const SYNC_DAYS_BACK: i64 = 30;

/// Inbound sync window, days after today.
pub const SYNC_DAYS_FORWARD: i64 = 60;

/// Minimum spacing between automatic background syncs.
pub const BACKGROUND_SYNC_INTERVAL: Duration = Duration::from_secs(60);

/// Tokens are refreshed when they expire within this many seconds.
pub const TOKEN_REFRESH_WINDOW_SECS: i64 = 5 * 60;
