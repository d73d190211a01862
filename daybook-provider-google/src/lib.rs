//! daybook-provider-google - Google Calendar provider for daybook
//!
//! Implements [`daybook_core::calendar::CalendarApi`] over the Calendar v3
//! REST API. OAuth tokens are kept in daybook's local store; the client
//! credentials come from the `[google]` section of the daybook config.

mod api;
mod authenticate;
mod from_google;
mod session;
mod to_google;
mod types;

pub use api::GoogleCalendar;
pub use authenticate::{authenticate, authorization_url, exchange_code, refresh_tokens};
pub use session::GoogleSession;
pub use types::GoogleCredentials;

/// Google's alias for the user's main calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";
