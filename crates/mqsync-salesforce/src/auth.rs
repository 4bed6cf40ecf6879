//! OAuth session establishment for the object store.

use std::{
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use mqsync_core::retry::truncate_for_error;
use serde::{Deserialize, Serialize};

use crate::AuthError;

pub const TOKEN_PATH: &str = "/services/oauth2/token";
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub const JWT_ASSERTION_LIFETIME_SECONDS: u64 = 3 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Authenticated handle used by every store call.
pub struct SalesforceSession {
    pub access_token: String,
    pub instance_url: String,
    pub token_type: String,
}

#[async_trait]
/// Trait contract for `Authenticator` behavior.
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> Result<SalesforceSession, AuthError>;
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    instance_url: Option<String>,
    token_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    exp: u64,
}

fn token_http_client(request_timeout_ms: u64) -> Result<reqwest::Client, AuthError> {
    let client = reqwest::Client::builder()
        .user_agent("mqsync-salesforce-auth")
        .timeout(Duration::from_millis(request_timeout_ms.max(1)))
        .build()?;
    Ok(client)
}

async fn exchange_token(
    http: &reqwest::Client,
    login_url: &str,
    form: &[(&str, &str)],
) -> Result<SalesforceSession, AuthError> {
    let response = http
        .post(format!("{}{TOKEN_PATH}", login_url.trim_end_matches('/')))
        .form(form)
        .send()
        .await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let parsed = serde_json::from_str::<TokenErrorResponse>(&body).unwrap_or_default();
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            error: if parsed.error.is_empty() {
                "unknown_error".to_string()
            } else {
                parsed.error
            },
            description: if parsed.error_description.is_empty() {
                truncate_for_error(&body, 320)
            } else {
                parsed.error_description
            },
        });
    }

    let parsed = serde_json::from_str::<TokenResponse>(&body)
        .map_err(|error| AuthError::InvalidResponse(format!("failed to decode token: {error}")))?;
    let access_token = parsed
        .access_token
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AuthError::InvalidResponse("missing access_token".to_string()))?;
    let instance_url = parsed
        .instance_url
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AuthError::InvalidResponse("missing instance_url".to_string()))?;

    tracing::debug!(instance_url = instance_url.as_str(), "store session opened");
    Ok(SalesforceSession {
        access_token,
        instance_url: instance_url.trim_end_matches('/').to_string(),
        token_type: parsed.token_type.unwrap_or_else(|| "Bearer".to_string()),
    })
}

#[derive(Debug, Clone)]
/// Inputs for the JWT bearer flow.
pub struct JwtBearerCredentials {
    pub login_url: String,
    pub client_id: String,
    pub username: String,
    pub key_path: PathBuf,
}

/// Signs an RS256 assertion with a private key and exchanges it for a session.
pub struct JwtBearerAuthenticator {
    credentials: JwtBearerCredentials,
    http: reqwest::Client,
}

impl JwtBearerAuthenticator {
    pub fn new(credentials: JwtBearerCredentials, request_timeout_ms: u64) -> Result<Self, AuthError> {
        Ok(Self {
            credentials,
            http: token_http_client(request_timeout_ms)?,
        })
    }

    pub(crate) async fn signed_assertion(&self, issued_at_unix: u64) -> Result<String, AuthError> {
        let pem = tokio::fs::read(&self.credentials.key_path)
            .await
            .map_err(|source| AuthError::KeyRead {
                path: self.credentials.key_path.clone(),
                source,
            })?;
        let key = EncodingKey::from_rsa_pem(&pem).map_err(AuthError::InvalidKey)?;
        let claims = JwtClaims {
            iss: &self.credentials.client_id,
            sub: &self.credentials.username,
            aud: self.credentials.login_url.trim_end_matches('/'),
            exp: issued_at_unix.saturating_add(JWT_ASSERTION_LIFETIME_SECONDS),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(AuthError::InvalidKey)
    }
}

#[async_trait]
impl Authenticator for JwtBearerAuthenticator {
    async fn authenticate(&self) -> Result<SalesforceSession, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let assertion = self.signed_assertion(now).await?;
        exchange_token(
            &self.http,
            &self.credentials.login_url,
            &[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ],
        )
        .await
    }
}

#[derive(Debug, Clone)]
/// Inputs for the username-password flow.
pub struct PasswordCredentials {
    pub login_url: String,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

pub struct PasswordAuthenticator {
    credentials: PasswordCredentials,
    http: reqwest::Client,
}

impl PasswordAuthenticator {
    pub fn new(credentials: PasswordCredentials, request_timeout_ms: u64) -> Result<Self, AuthError> {
        Ok(Self {
            credentials,
            http: token_http_client(request_timeout_ms)?,
        })
    }
}

#[async_trait]
impl Authenticator for PasswordAuthenticator {
    async fn authenticate(&self) -> Result<SalesforceSession, AuthError> {
        let credentials = &self.credentials;
        exchange_token(
            &self.http,
            &credentials.login_url,
            &[
                ("grant_type", "password"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ],
        )
        .await
    }
}
