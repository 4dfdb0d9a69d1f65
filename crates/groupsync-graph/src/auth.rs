//! OAuth2 client-credentials authentication with a bounded refresh ceiling.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::{GraphError, GraphResult, LOGIN_BASE_URL};

/// Maximum number of reauthentication attempts across one process run.
pub const REFRESH_LIMIT: u32 = 24;

/// Client credential material for the application registration.
#[derive(Debug, Clone)]
pub enum ClientAuth {
    /// Shared client secret.
    Secret(SecretString),
    /// Certificate identified by thumbprint. Token acquisition for this
    /// flow is delegated to an external credential provider.
    CertificateThumbprint(String),
}

/// Application credentials for the tenant.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Entra tenant ID.
    pub tenant_id: String,
    /// Application (client) ID.
    pub client_id: String,
    /// Secret or certificate material.
    pub auth: ClientAuth,
}

/// Token audience for the client-credentials flow.
///
/// The engine only ever requests Graph tokens; the security-API audience
/// is part of the shared token function's contract for other callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAudience {
    Graph,
    SecurityApi,
}

impl TokenAudience {
    /// The `.default` scope string for this audience.
    #[must_use]
    pub fn scope(self) -> &'static str {
        match self {
            TokenAudience::Graph => "https://graph.microsoft.com/.default",
            TokenAudience::SecurityApi => "https://api.securitycenter.microsoft.com/.default",
        }
    }
}

/// OAuth2 token response from the login endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[allow(dead_code)]
    token_type: String,
}

/// Cached bearer token.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Returns true if the token is expired or will expire within the grace period.
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

/// Process-wide authentication state: the bearer token and the shared
/// refresh counter. One `AuthContext` exists per run; the counter bounds
/// total reauthentication attempts across every call the run makes.
#[derive(Debug)]
pub struct AuthContext {
    credentials: Credentials,
    audience: TokenAudience,
    login_endpoint: String,
    http_client: reqwest::Client,
    cached_token: RwLock<Option<CachedToken>>,
    refresh_count: AtomicU32,
    refresh_limit: u32,
    grace_period: Duration,
}

impl AuthContext {
    /// Creates an auth context against the production login endpoint.
    #[must_use]
    pub fn new(credentials: Credentials, audience: TokenAudience) -> Self {
        Self::with_login_endpoint(credentials, audience, LOGIN_BASE_URL)
    }

    /// Creates an auth context against a custom login endpoint.
    #[must_use]
    pub fn with_login_endpoint(
        credentials: Credentials,
        audience: TokenAudience,
        login_endpoint: &str,
    ) -> Self {
        Self {
            credentials,
            audience,
            login_endpoint: login_endpoint.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
            cached_token: RwLock::new(None),
            refresh_count: AtomicU32::new(0),
            refresh_limit: REFRESH_LIMIT,
            grace_period: Duration::minutes(5),
        }
    }

    /// Overrides the refresh ceiling. Test hook.
    #[must_use]
    pub fn with_refresh_limit(mut self, limit: u32) -> Self {
        self.refresh_limit = limit;
        self
    }

    /// Number of reauthentication attempts consumed so far.
    #[must_use]
    pub fn refreshes_used(&self) -> u32 {
        self.refresh_count.load(Ordering::SeqCst)
    }

    /// Gets a valid bearer token, acquiring one on first use or after expiry.
    ///
    /// Initial acquisition and expiry-driven renewal do not count against
    /// the refresh ceiling; only unauthorized-driven [`Self::refresh`] does.
    #[instrument(skip(self), fields(tenant_id = %self.credentials.tenant_id))]
    pub async fn token(&self) -> GraphResult<String> {
        {
            let cache = self.cached_token.read().await;
            if let Some(ref token) = *cache {
                if !token.is_expired(self.grace_period) {
                    debug!("Using cached token");
                    return Ok(token.access_token.clone());
                }
            }
        }

        debug!("Acquiring access token");
        let new_token = self.acquire_token().await?;
        let access_token = new_token.access_token.clone();

        let mut cache = self.cached_token.write().await;
        *cache = Some(new_token);

        Ok(access_token)
    }

    /// Forces reacquisition after the API rejected the current token.
    ///
    /// Consumes one attempt from the shared ceiling; once the ceiling is
    /// reached every further call fails with [`GraphError::AuthExhausted`].
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> GraphResult<String> {
        // Single writer by construction: entries and calls are sequential.
        let used = self.refresh_count.load(Ordering::SeqCst);
        if used >= self.refresh_limit {
            return Err(GraphError::AuthExhausted {
                attempts: self.refresh_limit,
            });
        }
        self.refresh_count.fetch_add(1, Ordering::SeqCst);

        warn!(
            "Token rejected, reauthenticating (attempt {}/{})",
            used + 1,
            self.refresh_limit
        );

        let new_token = self.acquire_token().await?;
        let access_token = new_token.access_token.clone();

        let mut cache = self.cached_token.write().await;
        *cache = Some(new_token);

        Ok(access_token)
    }

    /// Acquires a new token using the client-credentials flow.
    async fn acquire_token(&self) -> GraphResult<CachedToken> {
        let secret = match &self.credentials.auth {
            ClientAuth::Secret(secret) => secret,
            ClientAuth::CertificateThumbprint(thumbprint) => {
                return Err(GraphError::Auth(format!(
                    "certificate credential flow (thumbprint {thumbprint}) requires an \
                     external token provider"
                )));
            }
        };

        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_endpoint, self.credentials.tenant_id
        );

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", &self.credentials.client_id),
            ("client_secret", secret.expose_secret()),
            ("scope", self.audience.scope()),
        ];

        let response = self
            .http_client
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GraphError::Auth(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Auth(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Auth(format!("Failed to parse token response: {e}")))?;

        let expires_at = Utc::now() + Duration::seconds(token_response.expires_in);
        debug!("Acquired new token, expires at {}", expires_at);

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret_credentials() -> Credentials {
        Credentials {
            tenant_id: "tenant-1".to_string(),
            client_id: "client-1".to_string(),
            auth: ClientAuth::Secret(SecretString::from("s3cret".to_string())),
        }
    }

    #[test]
    fn test_cached_token_expiry() {
        let token = CachedToken {
            access_token: "test".to_string(),
            expires_at: Utc::now() + Duration::minutes(10),
        };

        assert!(!token.is_expired(Duration::minutes(5)));
        assert!(token.is_expired(Duration::minutes(15)));
    }

    #[test]
    fn test_audience_scopes() {
        assert_eq!(
            TokenAudience::Graph.scope(),
            "https://graph.microsoft.com/.default"
        );
        assert_eq!(
            TokenAudience::SecurityApi.scope(),
            "https://api.securitycenter.microsoft.com/.default"
        );
    }

    #[tokio::test]
    async fn test_refresh_ceiling_exhausts() {
        let ctx = AuthContext::new(secret_credentials(), TokenAudience::Graph)
            .with_refresh_limit(0);

        let err = ctx.refresh().await.unwrap_err();
        assert!(matches!(err, GraphError::AuthExhausted { attempts: 0 }));
    }

    #[tokio::test]
    async fn test_certificate_flow_rejected_at_acquisition() {
        let creds = Credentials {
            tenant_id: "tenant-1".to_string(),
            client_id: "client-1".to_string(),
            auth: ClientAuth::CertificateThumbprint("AB12CD".to_string()),
        };
        let ctx = AuthContext::new(creds, TokenAudience::Graph);

        let err = ctx.token().await.unwrap_err();
        assert!(matches!(err, GraphError::Auth(_)));
    }
}
