use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::TOKEN_REFRESH_WINDOW_SECS;

/// OAuth tokens for a calendar account, persisted in user settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl OAuthTokens {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        let expires_at = (expires_in > 0).then(|| Utc::now() + Duration::seconds(expires_in));
        OAuthTokens {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// True when the access token expires within the refresh window. Tokens
    /// without a known expiry are used as-is until the provider rejects them.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - now <= Duration::seconds(TOKEN_REFRESH_WINDOW_SECS),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_expiring_in(secs: i64, now: DateTime<Utc>) -> OAuthTokens {
        OAuthTokens {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: Some(now + Duration::seconds(secs)),
        }
    }

    #[test]
    fn test_refresh_window() {
        let now = Utc::now();
        assert!(!tokens_expiring_in(3600, now).needs_refresh(now));
        assert!(tokens_expiring_in(299, now).needs_refresh(now));
        assert!(tokens_expiring_in(-10, now).needs_refresh(now));
    }

    #[test]
    fn test_unknown_expiry_is_not_refreshed() {
        let tokens = OAuthTokens::new("a".into(), "r".into(), 0);
        assert!(!tokens.needs_refresh(Utc::now()));
    }
}
