//! PostgREST-style HTTP row store.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{DaybookError, DaybookResult};
use crate::remote::{RemoteStore, Table};
use crate::settings::RemoteSettings;

pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    user_id: Option<String>,
}

impl RestStore {
    pub fn new(settings: &RemoteSettings) -> Self {
        RestStore {
            client: Client::new(),
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            user_id: settings.user_id.clone(),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.base_url, table.name())
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
    }

    async fn send(&self, request: RequestBuilder) -> DaybookResult<reqwest::Response> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| DaybookError::Remote(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body))
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn insert(&self, table: Table, row: Map<String, Value>) -> DaybookResult<()> {
        let request = self
            .client
            .post(self.table_url(table))
            .json(&Value::Array(vec![Value::Object(row)]));
        self.send(request).await?;
        Ok(())
    }

    async fn update(&self, table: Table, id: &str, fields: Map<String, Value>) -> DaybookResult<()> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{id}"))])
            .json(&Value::Object(fields));
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> DaybookResult<()> {
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{id}"))]);
        self.send(request).await?;
        Ok(())
    }

    async fn select(&self, table: Table) -> DaybookResult<Vec<Value>> {
        let mut query = vec![("select", "*".to_string())];
        if let Some(user_id) = &self.user_id {
            query.push(("user_id", format!("eq.{user_id}")));
        }

        let request = self.client.get(self.table_url(table)).query(&query);
        let response = self.send(request).await?;

        response
            .json()
            .await
            .map_err(|e| DaybookError::Remote(format!("Failed to decode {} rows: {e}", table.name())))
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Map an error response to a `DaybookError`, recognising missing columns.
pub(crate) fn classify_error(status: StatusCode, body: &str) -> DaybookError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message.unwrap_or_else(|| body.to_string());

    let schema_code = matches!(parsed.code.as_deref(), Some("PGRST204") | Some("42703"));
    if schema_code || message.contains("column") {
        if let Some(column) = missing_column_name(&message) {
            return DaybookError::MissingColumn(column);
        }
    }

    DaybookError::Remote(format!("HTTP {}: {}", status.as_u16(), message))
}

/// Extract the column from messages like
/// `Could not find the 'order' column of 'tasks' in the schema cache` or
/// `column "order" of relation "tasks" does not exist`.
fn missing_column_name(message: &str) -> Option<String> {
    if let Some(rest) = message.split("find the '").nth(1) {
        return rest.split('\'').next().map(str::to_string);
    }

    if message.contains("does not exist") {
        let rest = message.split("column ").nth(1)?;
        let name = rest.split_whitespace().next()?;
        let name = name.trim_matches('"');
        // `tasks.order` style qualifies the column with its table
        return Some(name.rsplit('.').next().unwrap_or(name).trim_matches('"').to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_schema_cache_error() {
        let body = r#"{"code":"PGRST204","message":"Could not find the 'order' column of 'tasks' in the schema cache"}"#;
        match classify_error(StatusCode::BAD_REQUEST, body) {
            DaybookError::MissingColumn(col) => assert_eq!(col, "order"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_postgres_undefined_column() {
        let body = r#"{"code":"42703","message":"column \"order\" of relation \"tasks\" does not exist"}"#;
        match classify_error(StatusCode::BAD_REQUEST, body) {
            DaybookError::MissingColumn(col) => assert_eq!(col, "order"),
            other => panic!("unexpected error: {other:?}"),
        }

        let body = r#"{"code":"42703","message":"column tasks.order does not exist"}"#;
        match classify_error(StatusCode::BAD_REQUEST, body) {
            DaybookError::MissingColumn(col) => assert_eq!(col, "order"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_other_errors() {
        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "upstream down");
        assert!(matches!(err, DaybookError::Remote(ref m) if m.contains("500")));
    }
}
