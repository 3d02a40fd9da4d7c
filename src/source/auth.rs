//! Database credentials
//!
//! Service-account keys are exchanged for short-lived OAuth2 access tokens
//! using a signed JWT bearer grant. Legacy database secrets are passed through
//! unchanged.

use crate::error::SourceError;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// OAuth scopes the database accepts
const SCOPES: &str =
    "https://www.googleapis.com/auth/firebase.database https://www.googleapis.com/auth/userinfo.email";

/// JWT bearer grant type
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Default token endpoint when the key file omits one
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for assertions
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh tokens this long before they expire
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Timeout for the token exchange request
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Service-account key file contents (the fields we use)
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Account e-mail, used as JWT issuer
    pub client_email: String,
    /// PEM-encoded RSA private key
    pub private_key: String,
    /// OAuth2 token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Owning project
    #[serde(default)]
    pub project_id: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Load a key file downloaded from the project console
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SourceError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Parse key file contents
    pub fn from_json(contents: &str) -> Result<Self, SourceError> {
        let key: Self = serde_json::from_str(contents)
            .map_err(|e| SourceError::Credentials(format!("invalid service account key: {}", e)))?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(SourceError::Credentials(
                "service account key is missing client_email or private_key".to_string(),
            ));
        }
        Ok(key)
    }

    /// Build a signed assertion for the token endpoint
    pub fn assertion(&self, issued_at: i64) -> Result<String, SourceError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SCOPES,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Access token and its expiry
#[derive(Clone)]
pub struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// How requests to the database authenticate
#[derive(Clone)]
pub enum DatabaseAuth {
    /// OAuth2 via a service account
    ServiceAccount {
        /// Key used to sign assertions
        key: ServiceAccountKey,
        /// Last token obtained
        cached: Option<CachedToken>,
    },
    /// Legacy database secret
    Secret(String),
    /// Public database, no credential
    Anonymous,
}

impl std::fmt::Debug for DatabaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServiceAccount { key, cached } => f
                .debug_struct("ServiceAccount")
                .field("key", key)
                .field("cached", cached)
                .finish(),
            Self::Secret(_) => f.write_str("Secret(<redacted>)"),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

impl DatabaseAuth {
    /// Authenticate with a service account
    pub fn service_account(key: ServiceAccountKey) -> Self {
        Self::ServiceAccount { key, cached: None }
    }

    /// Query parameter to attach to database requests
    pub fn query_param(&mut self, client: &Client) -> Result<Option<(&'static str, String)>, SourceError> {
        match self {
            Self::ServiceAccount { key, cached } => {
                let fresh = cached
                    .as_ref()
                    .filter(|t| t.expires_at > Instant::now() + REFRESH_MARGIN);
                let token = match fresh {
                    Some(token) => token.value.clone(),
                    None => {
                        let token = exchange(client, key)?;
                        let value = token.value.clone();
                        *cached = Some(token);
                        value
                    }
                };
                Ok(Some(("access_token", token)))
            }
            Self::Secret(secret) => Ok(Some(("auth", secret.clone()))),
            Self::Anonymous => Ok(None),
        }
    }

    /// Drop any cached token so the next request fetches a new one
    pub fn invalidate(&mut self) {
        if let Self::ServiceAccount { cached, .. } = self {
            *cached = None;
        }
    }
}

fn exchange(client: &Client, key: &ServiceAccountKey) -> Result<CachedToken, SourceError> {
    let assertion = key.assertion(Utc::now().timestamp())?;
    let response = client
        .post(&key.token_uri)
        .timeout(TOKEN_REQUEST_TIMEOUT)
        .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SourceError::Credentials(format!(
            "token exchange rejected ({}): {}",
            status, body
        )));
    }

    let token: TokenResponse = response.json()?;
    log::debug!(
        "Obtained database access token for {} (expires in {}s)",
        key.client_email,
        token.expires_in
    );
    Ok(CachedToken {
        value: token.access_token,
        expires_at: Instant::now() + Duration::from_secs(token.expires_in),
    })
}
