//! Account sign-up and password login, delegated to a hosted auth server.

use crate::services::jwt::JwtService;
use async_trait::async_trait;
use chrono::Duration;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthProviderError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Rejected(String),

    #[error("auth provider rate limit reached")]
    RateLimited,

    #[error("auth provider error: {0}")]
    Upstream(String),
}

impl From<AuthProviderError> for AppError {
    fn from(err: AuthProviderError) -> Self {
        match err {
            AuthProviderError::InvalidCredentials => AppError::unauthorized("Invalid email or password"),
            AuthProviderError::Rejected(msg) => AppError::bad_request(msg),
            AuthProviderError::RateLimited => {
                AppError::TooManyRequests("Too many authentication attempts".to_string(), Some(60))
            }
            AuthProviderError::Upstream(msg) => AppError::BadGateway(msg),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserInfo {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Session returned by the provider. Sign-ups that still await email
/// confirmation come back without tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUserInfo,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthSession, AuthProviderError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthProviderError>;
}

/// GoTrue-compatible REST client.
pub struct GoTrueAuthProvider {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Serialize)]
struct SignUpData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

#[derive(Serialize)]
struct PasswordGrantBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ProviderErrorBody {
    fn message(self) -> String {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .unwrap_or_else(|| "Request rejected by auth provider".to_string())
    }
}

impl GoTrueAuthProvider {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self, AuthProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AuthProviderError::Upstream(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<reqwest::Response, AuthProviderError> {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthProviderError::Upstream(e.to_string()))
    }
}

/// Signup replies are either a full session or, pending confirmation, the
/// bare user object.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpReply {
    Session(AuthSession),
    User(AuthUserInfo),
}

#[async_trait]
impl AuthProvider for GoTrueAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthSession, AuthProviderError> {
        let response = self
            .post(
                "/auth/v1/signup",
                &SignUpBody {
                    email,
                    password,
                    data: SignUpData { display_name },
                },
            )
            .await?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .map(ProviderErrorBody::message)
                .unwrap_or_else(|_| format!("Sign-up failed with status {}", status));
            return Err(match status {
                400 | 422 => AuthProviderError::Rejected(message),
                429 => AuthProviderError::RateLimited,
                _ => AuthProviderError::Upstream(message),
            });
        }

        let reply: SignUpReply = response
            .json()
            .await
            .map_err(|e| AuthProviderError::Upstream(format!("Invalid sign-up reply: {}", e)))?;

        Ok(match reply {
            SignUpReply::Session(session) => session,
            SignUpReply::User(user) => AuthSession {
                access_token: None,
                refresh_token: None,
                expires_in: None,
                user,
            },
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthProviderError> {
        let response = self
            .post(
                "/auth/v1/token?grant_type=password",
                &PasswordGrantBody { email, password },
            )
            .await?;

        let status = response.status().as_u16();
        match status {
            200..=299 => response
                .json()
                .await
                .map_err(|e| AuthProviderError::Upstream(format!("Invalid token reply: {}", e))),
            400 | 401 | 422 => Err(AuthProviderError::InvalidCredentials),
            429 => Err(AuthProviderError::RateLimited),
            _ => Err(AuthProviderError::Upstream(format!(
                "Login failed with status {}",
                status
            ))),
        }
    }
}

struct MockAccount {
    id: String,
    password: String,
    app_role: Option<String>,
}

/// In-memory provider issuing real HS256 tokens.
pub struct MockAuthProvider {
    jwt: JwtService,
    accounts: RwLock<HashMap<String, MockAccount>>,
}

impl MockAuthProvider {
    pub fn new(jwt: JwtService) -> Self {
        Self {
            jwt,
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Register an administrator account up front.
    pub async fn add_admin(&self, email: &str, password: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.accounts.write().await.insert(
            email.to_lowercase(),
            MockAccount {
                id: id.clone(),
                password: password.to_string(),
                app_role: Some("admin".to_string()),
            },
        );
        id
    }

    fn session(&self, id: &str, email: &str, app_role: Option<&str>) -> Result<AuthSession, AuthProviderError> {
        let token = self
            .jwt
            .generate_access_token(id, email, app_role, Duration::hours(1))
            .map_err(|e| AuthProviderError::Upstream(e.to_string()))?;
        Ok(AuthSession {
            access_token: Some(token),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_in: Some(3600),
            user: AuthUserInfo {
                id: id.to_string(),
                email: Some(email.to_string()),
            },
        })
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _display_name: Option<&str>,
    ) -> Result<AuthSession, AuthProviderError> {
        let key = email.to_lowercase();
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AuthProviderError::Rejected("User already registered".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        accounts.insert(
            key,
            MockAccount {
                id: id.clone(),
                password: password.to_string(),
                app_role: None,
            },
        );
        drop(accounts);

        self.session(&id, email, None)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthProviderError> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(&email.to_lowercase())
            .filter(|a| a.password == password)
            .ok_or(AuthProviderError::InvalidCredentials)?;
        self.session(&account.id, email, account.app_role.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_sign_up_then_sign_in() {
        let jwt = JwtService::new("secret").unwrap();
        let provider = MockAuthProvider::new(jwt.clone());

        let session = provider.sign_up("a@b.test", "password1", None).await.unwrap();
        let token = session.access_token.unwrap();
        assert_eq!(jwt.validate_access_token(&token).unwrap().sub, session.user.id);

        assert!(provider.sign_in("A@B.test", "password1").await.is_ok());
        assert!(matches!(
            provider.sign_in("a@b.test", "wrong").await,
            Err(AuthProviderError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_rejected() {
        let provider = MockAuthProvider::new(JwtService::new("secret").unwrap());
        provider.sign_up("a@b.test", "password1", None).await.unwrap();
        assert!(matches!(
            provider.sign_up("a@b.test", "password2", None).await,
            Err(AuthProviderError::Rejected(_))
        ));
    }

    #[test]
    fn signup_reply_accepts_bare_user() {
        let reply: SignUpReply =
            serde_json::from_str(r#"{"id":"u1","email":"a@b.test","aud":"authenticated"}"#).unwrap();
        assert!(matches!(reply, SignUpReply::User(u) if u.id == "u1"));
    }

    #[test]
    fn signup_reply_accepts_session() {
        let reply: SignUpReply = serde_json::from_str(
            r#"{"access_token":"t","refresh_token":"r","expires_in":3600,"user":{"id":"u1"}}"#,
        )
        .unwrap();
        assert!(matches!(reply, SignUpReply::Session(s) if s.access_token.as_deref() == Some("t")));
    }
}
