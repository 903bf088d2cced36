//! Review backend HTTP client.
//!
//! Thin wrapper over the backend's JSON endpoints. Mutating requests carry
//! the `_xsrf` cookie value both as a cookie and as the `X-Xsrftoken`
//! header, matching what the backend's CSRF middleware expects. Submission
//! is a single round trip with no automatic retry: failures surface to the
//! caller with the backend's message intact so the user can resubmit.

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

use iam_request_wizard_core::ReviewRequest;

use crate::errors::{ClientError, Result};

/// Cookie the backend issues its CSRF token under
pub const XSRF_COOKIE: &str = "_xsrf";

/// Header mutating requests must echo the token in
pub const XSRF_HEADER: &str = "X-Xsrftoken";

/// One typeahead hit; the backend guarantees at least a title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeaheadResult {
    pub title: String,
    /// Any additional per-category fields the backend includes
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Typeahead results grouped by category
pub type TypeaheadResults = HashMap<String, Vec<TypeaheadResult>>;

#[derive(Debug, Deserialize)]
struct EligibleRolesResponse {
    eligible_roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SubmissionResponse {
    status: String,
    request_id: Option<String>,
    message: Option<String>,
}

/// Client for the review backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    xsrf_token: Option<String>,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    /// Returns `ClientError::InvalidUrl` when the base URL does not parse.
    pub fn new(base_url: &str) -> Result<Self> {
        // A trailing slash keeps Url::join from eating the last path segment
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(&normalized)?,
            xsrf_token: None,
        })
    }

    /// Attach the CSRF token read from the `_xsrf` cookie
    #[must_use]
    pub fn with_xsrf_token(mut self, token: impl Into<String>) -> Self {
        self.xsrf_token = Some(token.into());
        self
    }

    /// `GET /api/v1/roles`: roles the caller may request changes for.
    ///
    /// # Errors
    /// Returns `ClientError::Http` on transport failures and
    /// `ClientError::UnexpectedResponse` on a malformed body.
    pub async fn eligible_roles(&self) -> Result<Vec<String>> {
        let url = self.base_url.join("api/v1/roles")?;
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body: EligibleRolesResponse = response
            .json()
            .await
            .map_err(|e| ClientError::unexpected_response("/api/v1/roles", e.to_string()))?;
        Ok(body.eligible_roles)
    }

    /// `GET /policies/typeahead`: search backend resources as the user
    /// types. Callers should go through
    /// [`TypeaheadSearch`](crate::TypeaheadSearch), which adds debounce and
    /// stale-response suppression.
    ///
    /// # Errors
    /// Returns `ClientError::Http` on transport failures and
    /// `ClientError::UnexpectedResponse` on a malformed body.
    pub async fn typeahead(
        &self,
        resource: &str,
        search: &str,
        account_id: &str,
    ) -> Result<TypeaheadResults> {
        let mut url = self.base_url.join("policies/typeahead")?;
        url.query_pairs_mut()
            .append_pair("resource", resource)
            .append_pair("search", search)
            .append_pair("account_id", account_id);

        debug!("typeahead query resource={resource} search={search}");
        let response = self.http.get(url).send().await?.error_for_status()?;
        response
            .json()
            .await
            .map_err(|e| ClientError::unexpected_response("/policies/typeahead", e.to_string()))
    }

    /// `POST /policies/submit_for_review`: hand the packaged request to
    /// the backend and return the created request id.
    ///
    /// # Errors
    /// - `ClientError::MissingCsrfToken` when no token was attached;
    /// - `ClientError::Backend` when the backend answers with an error
    ///   status payload;
    /// - `ClientError::Http` on transport failures.
    pub async fn submit_for_review(&self, request: &ReviewRequest) -> Result<String> {
        let token = self
            .xsrf_token
            .as_deref()
            .ok_or(ClientError::MissingCsrfToken)?;

        let url = self.base_url.join("policies/submit_for_review")?;
        let response = self
            .http
            .post(url)
            .header(XSRF_HEADER, token)
            .header(reqwest::header::COOKIE, format!("{XSRF_COOKIE}={token}"))
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let body: SubmissionResponse = response.json().await.map_err(|e| {
            ClientError::unexpected_response("/policies/submit_for_review", e.to_string())
        })?;

        if body.status != "success" {
            return Err(ClientError::backend(
                body.message
                    .unwrap_or_else(|| "backend returned an error without a message".to_string()),
            ));
        }

        let request_id = body.request_id.ok_or_else(|| {
            ClientError::unexpected_response(
                "/policies/submit_for_review",
                "success response missing request_id",
            )
        })?;

        info!("review request {request_id} created for {}", request.arn);
        Ok(request_id)
    }
}
