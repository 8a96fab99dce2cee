use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Validates access tokens issued by the auth provider (HS256, shared secret).
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Database role, e.g. `authenticated`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    pub exp: i64,
    pub iat: i64,
}

impl AccessTokenClaims {
    /// Admin rights come from `app_metadata`, which only the provider can write.
    pub fn is_admin(&self) -> bool {
        self.app_metadata.role.as_deref() == Some("admin")
    }
}

impl JwtService {
    pub fn new(secret: &str) -> Result<Self, anyhow::Error> {
        if secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Issue a token the way the auth provider would. Used by the mock
    /// provider and in tests.
    pub fn generate_access_token(
        &self,
        user_id: &str,
        email: &str,
        app_role: Option<&str>,
        ttl: Duration,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: Some(email.to_string()),
            role: Some("authenticated".to_string()),
            app_metadata: AppMetadata {
                role: app_role.map(str::to_string),
            },
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))
    }
}
