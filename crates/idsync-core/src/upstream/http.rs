//! HTTP client for the identity provider's account listing endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use super::DirectorySource;
use crate::error::{Error, Result};
use crate::models::{UpstreamPage, UpstreamUser};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Connection settings for [`HttpDirectorySource`].
#[derive(Clone, PartialEq, Eq)]
pub struct HttpSourceConfig {
    /// Project-scoped API base, e.g. `https://identitytoolkit.googleapis.com/v1/projects/acme`
    pub base_url: String,
    pub access_token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpSourceConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpSourceConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Lists upstream accounts through `accounts:batchGet`.
///
/// Built once at startup and handed to the reconciler; a bad endpoint or
/// token fails construction instead of every cycle.
#[derive(Clone)]
pub struct HttpDirectorySource {
    endpoint: String,
    access_token: String,
    client: reqwest::Client,
}

impl HttpDirectorySource {
    pub fn new(config: HttpSourceConfig) -> Result<Self> {
        let base_url = normalize_base_url(config.base_url)?;
        let access_token = normalize_text_option(Some(config.access_token)).ok_or_else(|| {
            Error::InvalidInput("upstream access token must not be empty".to_string())
        })?;

        Ok(Self {
            endpoint: format!("{base_url}/accounts:batchGet"),
            access_token,
            client: reqwest::Client::builder().timeout(config.timeout).build()?,
        })
    }

    /// The fully-qualified listing endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DirectorySource for HttpDirectorySource {
    async fn list_page(&self, page_token: Option<&str>, page_size: u32) -> Result<UpstreamPage> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("maxResults", page_size.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("nextPageToken", token)]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Upstream(parse_api_error(status, &body)));
        }

        parse_page(&body)
    }
}

/// Parse one `accounts:batchGet` response body.
///
/// Accounts without a `localId` are skipped with a warning; they cannot be
/// matched against local records.
pub fn parse_page(body: &str) -> Result<UpstreamPage> {
    let payload: BatchGetResponse = serde_json::from_str(body)?;

    let users = payload
        .users
        .into_iter()
        .filter_map(|account| {
            let Some(id) = normalize_text_option(account.local_id) else {
                tracing::warn!("Skipping upstream account without localId");
                return None;
            };
            Some(UpstreamUser {
                id,
                display_name: account.display_name,
                email: account.email,
                disabled: account.disabled,
                created_at: account.created_at.and_then(|raw| raw.trim().parse().ok()),
            })
        })
        .collect();

    Ok(UpstreamPage {
        users,
        next_page_token: normalize_text_option(payload.next_page_token),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    disabled: Option<bool>,
    // Unix ms, encoded as a string
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error.and_then(|error| error.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        Error::InvalidInput("upstream base URL must not be empty".to_string())
    })?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "upstream base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config(base_url: &str, token: &str) -> HttpSourceConfig {
        HttpSourceConfig {
            base_url: base_url.to_string(),
            access_token: token.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn new_rejects_invalid_configuration() {
        assert!(HttpDirectorySource::new(config("", "token")).is_err());
        assert!(HttpDirectorySource::new(config("identity.example.com", "token")).is_err());
        assert!(HttpDirectorySource::new(config("https://identity.example.com", "  ")).is_err());
    }

    #[test]
    fn new_builds_listing_endpoint() {
        let source =
            HttpDirectorySource::new(config("https://identity.example.com/v1/projects/acme/", "t"))
                .unwrap();
        assert_eq!(
            source.endpoint(),
            "https://identity.example.com/v1/projects/acme/accounts:batchGet"
        );
    }

    #[test]
    fn config_debug_redacts_token() {
        let debug = format!("{:?}", config("https://identity.example.com", "secret"));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn parse_page_maps_accounts() {
        let body = r#"
        {
          "users": [
            {
              "localId": "u1",
              "email": "alice@example.com",
              "displayName": "Alice",
              "disabled": false,
              "createdAt": "1700000000000"
            },
            { "localId": "u2", "email": "bob@example.com" }
          ],
          "nextPageToken": "page-2"
        }
        "#;

        let page = parse_page(body).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("page-2"));
        assert_eq!(
            page.users[0],
            UpstreamUser {
                id: "u1".to_string(),
                display_name: Some("Alice".to_string()),
                email: Some("alice@example.com".to_string()),
                disabled: Some(false),
                created_at: Some(1_700_000_000_000),
            }
        );
        assert_eq!(page.users[1].display_name, None);
        assert_eq!(page.users[1].disabled, None);
    }

    #[test]
    fn parse_page_handles_last_and_empty_pages() {
        let page = parse_page(r#"{ "nextPageToken": "" }"#).unwrap();
        assert!(page.users.is_empty());
        assert_eq!(page.next_page_token, None);
    }

    #[test]
    fn parse_page_skips_accounts_without_id() {
        let page = parse_page(r#"{ "users": [{ "email": "x@example.com" }, { "localId": "u3" }] }"#)
            .unwrap();
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].id, "u3");
    }

    #[test]
    fn parse_page_rejects_malformed_json() {
        assert!(matches!(
            parse_page("<html>"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn parse_api_error_prefers_provider_message() {
        let message = parse_api_error(
            StatusCode::FORBIDDEN,
            r#"{ "error": { "code": 403, "message": "PERMISSION_DENIED" } }"#,
        );
        assert_eq!(message, "PERMISSION_DENIED (403)");

        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "  "),
            "HTTP 502"
        );
        assert_eq!(
            parse_api_error(StatusCode::SERVICE_UNAVAILABLE, "upstream down"),
            "upstream down (503)"
        );
    }
}
