//! OAuth 2.0 authorization-code flow against Google, with a loopback
//! listener catching the redirect.

use anyhow::{Context, Result};
use daybook_core::calendar::OAuthTokens;
use daybook_core::error::{DaybookError, DaybookResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

use crate::session::GoogleSession;
use crate::types::{GoogleCredentials, TokenError, TokenResponse};

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const REDIRECT_PORT: u16 = 8085;

pub fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

pub fn redirect_address() -> String {
    format!("127.0.0.1:{}", REDIRECT_PORT)
}

/// Consent page URL. `offline` access plus `consent` prompt makes Google
/// hand out a refresh token every time.
pub fn authorization_url(creds: &GoogleCredentials, state: &str) -> Result<Url> {
    let scope = SCOPES.join(" ");
    let url = Url::parse_with_params(
        AUTH_URL,
        &[
            ("client_id", creds.client_id.as_str()),
            ("redirect_uri", redirect_uri().as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )?;
    Ok(url)
}

/// Run the interactive flow and store the resulting tokens in `session`.
pub async fn authenticate(session: &GoogleSession) -> Result<()> {
    let state = daybook_core::task::new_id();
    let auth_url = authorization_url(session.credentials(), &state)?;

    eprintln!("\nOpen this URL in your browser to authenticate:\n");
    eprintln!("{}\n", auth_url);

    // Try to open the browser automatically
    if open::that(auth_url.as_str()).is_err() {
        eprintln!("(Could not open browser automatically, please copy the URL above)");
    }

    let code = wait_for_callback(&state).await?;

    eprintln!("\nReceived authorization code, exchanging for tokens...");

    let tokens = exchange_code(session.http(), session.credentials(), &code).await?;
    session.save(tokens).await?;

    eprintln!("Authentication successful!");
    Ok(())
}

pub async fn exchange_code(
    http: &reqwest::Client,
    creds: &GoogleCredentials,
    code: &str,
) -> Result<OAuthTokens> {
    let response = http
        .post(TOKEN_URL)
        .form(&[
            ("code", code),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("redirect_uri", redirect_uri().as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .context("Failed to send token request to Google")?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        anyhow::bail!("Failed to exchange authorization code: {}", error_text);
    }

    let tokens: TokenResponse = response
        .json()
        .await
        .context("Failed to parse token response from Google")?;

    let refresh_token = tokens
        .refresh_token
        .context("Google did not return a refresh token")?;

    Ok(OAuthTokens::new(tokens.access_token, refresh_token, tokens.expires_in))
}

/// Trade a refresh token for a new access token. A revoked or expired grant
/// is reported as [`DaybookError::CalendarAuthExpired`].
pub async fn refresh_tokens(
    http: &reqwest::Client,
    creds: &GoogleCredentials,
    refresh_token: &str,
) -> DaybookResult<OAuthTokens> {
    let response = http
        .post(TOKEN_URL)
        .form(&[
            ("refresh_token", refresh_token),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await
        .map_err(|e| DaybookError::Calendar(format!("Failed to refresh token: {}", e)))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(classify_refresh_error(&body));
    }

    let tokens: TokenResponse = serde_json::from_str(&body)?;

    // Google typically doesn't return a new refresh_token on refresh
    let refresh_token = tokens.refresh_token.unwrap_or_else(|| refresh_token.to_string());
    Ok(OAuthTokens::new(tokens.access_token, refresh_token, tokens.expires_in))
}

fn classify_refresh_error(body: &str) -> DaybookError {
    match serde_json::from_str::<TokenError>(body) {
        Ok(err) if err.error == "invalid_grant" || err.error == "unauthorized_client" => {
            DaybookError::CalendarAuthExpired
        }
        Ok(err) => DaybookError::Calendar(format!(
            "Failed to refresh token: {}",
            err.error_description.unwrap_or(err.error)
        )),
        Err(_) => DaybookError::Calendar(format!("Failed to refresh token: {}", body)),
    }
}

/// Pull the authorization code out of the callback's HTTP request line.
fn parse_callback(request_line: &str, expected_state: &str) -> Result<String> {
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Invalid HTTP request"))?;

    let url = Url::parse(&format!("http://localhost{}", url_part))?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        anyhow::bail!("Authorization was denied: {}", error);
    }
    if param("state").as_deref() != Some(expected_state) {
        anyhow::bail!("OAuth state mismatch in callback");
    }
    param("code").ok_or_else(|| anyhow::anyhow!("No code in callback"))
}

async fn wait_for_callback(expected_state: &str) -> Result<String> {
    let listener = TcpListener::bind(redirect_address())
        .await
        .context("Failed to bind OAuth callback listener")?;

    let (stream, _) = listener
        .accept()
        .await
        .context("Failed to accept OAuth callback")?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read OAuth callback request line")?;

    let result = parse_callback(&request_line, expected_state);

    let body = match &result {
        Ok(_) => "<h1>Authentication successful!</h1>\
            <p>You can close this window and return to the terminal.</p>",
        Err(_) => "<h1>Authentication failed</h1>\
            <p>Return to the terminal for details.</p>",
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>{}</body></html>",
        body
    );

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write OAuth callback response")?;
    stream.flush().await?;

    result
}
