//! Keeps a valid Google access token around for API calls.
//!
//! Tokens live in the local store under the Google session key and are
//! refreshed shortly before they expire.

use chrono::Utc;
use daybook_core::calendar::OAuthTokens;
use daybook_core::error::{DaybookError, DaybookResult};
use daybook_core::store::{LocalStore, keys};
use tokio::sync::Mutex;

use crate::authenticate::refresh_tokens;
use crate::types::GoogleCredentials;

pub struct GoogleSession {
    http: reqwest::Client,
    credentials: GoogleCredentials,
    store: LocalStore,
    tokens: Mutex<Option<OAuthTokens>>,
}

impl GoogleSession {
    pub fn new(credentials: GoogleCredentials, store: LocalStore) -> Self {
        let tokens: Option<OAuthTokens> = store.get(keys::GOOGLE_SESSION, None);
        GoogleSession {
            http: reqwest::Client::new(),
            credentials,
            store,
            tokens: Mutex::new(tokens),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn credentials(&self) -> &GoogleCredentials {
        &self.credentials
    }

    pub async fn is_connected(&self) -> bool {
        self.tokens.lock().await.is_some()
    }

    pub async fn save(&self, tokens: OAuthTokens) -> DaybookResult<()> {
        self.store.set(keys::GOOGLE_SESSION, &tokens)?;
        *self.tokens.lock().await = Some(tokens);
        Ok(())
    }

    /// Forget the stored tokens; the user has to reconnect.
    pub async fn disconnect(&self) -> DaybookResult<()> {
        self.store.remove(keys::GOOGLE_SESSION)?;
        *self.tokens.lock().await = None;
        Ok(())
    }

    /// A usable access token, refreshed first when it is about to expire.
    pub async fn access_token(&self) -> DaybookResult<String> {
        let mut guard = self.tokens.lock().await;
        let Some(tokens) = guard.as_ref() else {
            return Err(DaybookError::CalendarAuthExpired);
        };

        if !tokens.needs_refresh(Utc::now()) {
            return Ok(tokens.access_token.clone());
        }

        let refresh_token = tokens.refresh_token.clone();
        tracing::debug!("refreshing Google access token");
        match refresh_tokens(&self.http, &self.credentials, &refresh_token).await {
            Ok(fresh) => {
                let access_token = fresh.access_token.clone();
                self.store.set(keys::GOOGLE_SESSION, &fresh)?;
                *guard = Some(fresh);
                Ok(access_token)
            }
            Err(e) if e.is_auth_failure() => {
                tracing::warn!("Google refresh token was rejected; reconnect required");
                self.store.remove(keys::GOOGLE_SESSION)?;
                *guard = None;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
