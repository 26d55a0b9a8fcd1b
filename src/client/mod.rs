//! Identity provider API client.
//!
//! One long-lived HTTP client bound to the provider's API base URL. All
//! requests carry JSON accept/content headers and SSWS token auth.
//! Idempotent GETs pass through a bounded retry loop at this layer; no
//! higher layer retries, so a failure surfaced from here is terminal for
//! the calling operation.

pub mod entities;
pub mod fetcher;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(7);
const MAX_GET_ATTEMPTS: u32 = 3;

/// Which object type an admin role operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTarget {
    User,
    Group,
}

impl RoleTarget {
    fn segment(self) -> &'static str {
        match self {
            RoleTarget::User => "users",
            RoleTarget::Group => "groups",
        }
    }
}

pub struct IdpClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    page_delay: Duration,
}

impl IdpClient {
    /// Build the client against an API base URL such as
    /// `https://example.okta.com/api/v1`.
    pub fn new(base_url: &str, api_token: &str) -> Result<Self> {
        Ok(Self {
            http: build_http(api_token, REQUEST_TIMEOUT)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            page_delay: Duration::from_secs(1),
        })
    }

    /// Override the courtesy delay between harvested pages.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Rebuild the transport with a different per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = build_http(&self.api_token, timeout)?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_delay(&self) -> Duration {
        self.page_delay
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with bounded retry on transport failures. This is the only
    /// place in the shell where requests are retried.
    pub(crate) async fn get_with_retry(
        &self,
        url: &str,
        params: Option<&[(&str, &str)]>,
    ) -> Result<Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut request = self.http.get(url);
            if let Some(params) = params {
                request = request.query(params);
            }

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < MAX_GET_ATTEMPTS && (e.is_connect() || e.is_timeout()) => {
                    warn!(attempt, url, "transport failure, retrying: {e}");
                    tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn get_json(&self, path: &str, params: Option<&[(&str, &str)]>) -> Result<Value> {
        let response = self.get_with_retry(&self.api_url(path), params).await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn get_json_array(&self, path: &str, params: Option<&[(&str, &str)]>) -> Result<Vec<Value>> {
        let value = self.get_json(path, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn post_json(
        &self,
        path: &str,
        params: Option<&[(&str, &str)]>,
        body: &Value,
    ) -> Result<Value> {
        let mut request = self.http.post(self.api_url(path)).json(body);
        if let Some(params) = params {
            request = request.query(params);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        debug!(path, "POST succeeded");
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        Ok(response.json().await.unwrap_or(Value::Null))
    }

    /// Get the user linked to the current API token.
    pub async fn current_user(&self) -> Result<Value> {
        self.get_json("/users/me", None).await
    }

    /// Get a user by its unique ID.
    pub async fn user(&self, user_id: &str) -> Result<Value> {
        self.get_json(&format!("/users/{user_id}"), None).await
    }

    /// Get a user's group memberships.
    pub async fn user_groups(&self, user_id: &str) -> Result<Vec<Value>> {
        self.get_json_array(&format!("/users/{user_id}/groups"), None).await
    }

    /// List a user's enrolled MFA factors.
    pub async fn user_factors(&self, user_id: &str) -> Result<Vec<Value>> {
        self.get_json_array(&format!("/users/{user_id}/factors"), None).await
    }

    /// List the admin roles assigned to a user or group. Only a token with
    /// the SUPER_ADMIN role can view, assign, or remove admin roles.
    pub async fn assigned_roles(&self, target: RoleTarget, id: &str) -> Result<Vec<Value>> {
        self.get_json_array(&format!("/{}/{id}/roles", target.segment()), None).await
    }

    /// Assign an admin role to a user or group.
    pub async fn assign_admin_role(
        &self,
        target: RoleTarget,
        id: &str,
        role_type: &str,
    ) -> Result<Value> {
        let body = serde_json::json!({ "type": role_type });
        self.post_json(&format!("/{}/{id}/roles", target.segment()), None, &body).await
    }

    /// Create a user, optionally activating it immediately.
    pub async fn create_user(&self, payload: &Value, activate: bool) -> Result<Value> {
        let params = [("activate", if activate { "true" } else { "false" })];
        self.post_json("/users", Some(&params), payload).await
    }

    /// Get all policies of one type. The policies endpoint returns the
    /// full list for a type in a single page.
    pub async fn policies_by_type(&self, policy_type: &str) -> Result<Vec<Value>> {
        let params = [("type", policy_type)];
        self.get_json_array("/policies", Some(&params)).await
    }

    /// Get a policy object, optionally expanded with its rules. The
    /// provider caps the expansion at twenty rules per policy.
    pub async fn policy(&self, policy_id: &str, with_rules: bool) -> Result<Value> {
        let params = [("expand", "rules")];
        let params = with_rules.then_some(&params[..]);
        self.get_json(&format!("/policies/{policy_id}"), params).await
    }

    /// Execute a lifecycle operation (`activate` / `deactivate`) on a policy.
    pub async fn policy_lifecycle(&self, policy_id: &str, operation: &str) -> Result<()> {
        let path = format!("/policies/{policy_id}/lifecycle/{}", operation.to_lowercase());
        self.post_json(&path, None, &serde_json::json!({})).await?;
        Ok(())
    }
}

fn build_http(api_token: &str, timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut auth = HeaderValue::from_str(&format!("SSWS {api_token}"))
        .map_err(|_| Error::Validation("api-token".to_string()))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    Ok(reqwest::Client::builder().timeout(timeout).default_headers(headers).build()?)
}

/// Convert a non-success response into the API error taxonomy, pulling the
/// provider's `errorCode`/`errorSummary` fields out of the body when present.
pub(crate) async fn api_error(response: Response) -> Error {
    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("unknown").to_string();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    Error::Api {
        status: status.as_u16(),
        reason,
        error_code: body.get("errorCode").and_then(Value::as_str).map(str::to_string),
        error_summary: body.get("errorSummary").and_then(Value::as_str).map(str::to_string),
    }
}
