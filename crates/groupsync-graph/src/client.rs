//! Graph API HTTP client with token-refresh retry and pagination.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{AuthContext, GraphError, GraphResult, GRAPH_BASE_URL};

/// Response wrapper for paginated Graph API responses.
#[derive(Debug, Deserialize)]
pub struct ODataResponse<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Authenticated Graph API client.
///
/// Every request runs through a bounded retry loop: an unauthorized
/// response triggers one reauthentication against the shared ceiling and
/// a retry of the same call; throttling and gateway errors back off and
/// retry a fixed number of times; anything else maps to a typed error.
#[derive(Debug)]
pub struct GraphClient {
    http_client: reqwest::Client,
    auth: Arc<AuthContext>,
    base_url: String,
    max_transient_retries: u32,
}

impl GraphClient {
    /// Creates a client against the production Graph endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(auth: Arc<AuthContext>) -> GraphResult<Self> {
        Self::with_base_url(auth, GRAPH_BASE_URL)
    }

    /// Creates a client against a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_base_url(auth: Arc<AuthContext>, base_url: &str) -> GraphResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GraphError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            auth,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_transient_retries: 5,
        })
    }

    /// Returns the base URL for Graph API requests.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Performs a GET request and deserializes the response body.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> GraphResult<T> {
        let response = self
            .send(reqwest::Method::GET, url, None::<&serde_json::Value>)
            .await?;
        response.json().await.map_err(GraphError::from)
    }

    /// Performs a PATCH request, discarding the (usually empty) response body.
    #[instrument(skip(self, body))]
    pub async fn patch<B: serde::Serialize>(&self, url: &str, body: &B) -> GraphResult<()> {
        self.send(reqwest::Method::PATCH, url, Some(body)).await?;
        Ok(())
    }

    /// Performs a DELETE request.
    #[instrument(skip(self))]
    pub async fn delete(&self, url: &str) -> GraphResult<()> {
        self.send(reqwest::Method::DELETE, url, None::<&serde_json::Value>)
            .await?;
        Ok(())
    }

    /// Sends one request through the retry loop and returns the successful
    /// response.
    async fn send<B: serde::Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&B>,
    ) -> GraphResult<reqwest::Response> {
        let mut transient_retries = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            let token = self.auth.token().await?;

            let mut request = self
                .http_client
                .request(method.clone(), url)
                .bearer_auth(&token);

            if let Some(b) = body {
                request = request.json(b);
            }

            let response = request.send().await?;
            let status = response.status();

            // Rejected token: reauthenticate once against the shared
            // ceiling and replay the same call.
            if status == reqwest::StatusCode::UNAUTHORIZED {
                warn!("Unauthorized response from {}, reauthenticating", url);
                self.auth.refresh().await?;
                continue;
            }

            // Throttling and gateway errors are retried with backoff.
            if matches!(
                status,
                reqwest::StatusCode::TOO_MANY_REQUESTS
                    | reqwest::StatusCode::BAD_GATEWAY
                    | reqwest::StatusCode::SERVICE_UNAVAILABLE
                    | reqwest::StatusCode::GATEWAY_TIMEOUT
            ) && transient_retries < self.max_transient_retries
            {
                let wait = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map_or(delay, Duration::from_secs);

                transient_retries += 1;
                warn!(
                    "Transient error {}, retry {}/{} after {:?}",
                    status, transient_retries, self.max_transient_retries, wait
                );
                tokio::time::sleep(wait).await;
                delay *= 2;
                continue;
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(GraphError::NotFound(url.to_string()));
            }

            if status.is_success() {
                return Ok(response);
            }

            return Err(GraphError::Api {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
    }

    /// Fetches all pages of a paginated response, handing each page to the
    /// callback until the next link is exhausted.
    #[instrument(skip(self, callback))]
    pub async fn get_paginated<T, F>(&self, initial_url: &str, mut callback: F) -> GraphResult<()>
    where
        T: DeserializeOwned,
        F: FnMut(Vec<T>) -> GraphResult<()>,
    {
        let mut url = initial_url.to_string();

        loop {
            debug!("Fetching page: {}", url);
            let response: ODataResponse<T> = self.get(&url).await?;

            callback(response.value)?;

            match response.next_link {
                Some(next) => url = next,
                None => return Ok(()),
            }
        }
    }
}
