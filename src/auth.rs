use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

use crate::config::AuthConfig;
use crate::error::{Result, TravelAgentError};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Who is calling, as far as the headers tell. Bearer tokens are not
/// verified; they only map to a stable pseudo user id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Option<String>,
    pub api_key: Option<String>,
}

impl CallerIdentity {
    pub fn from_headers(authorization: Option<&str>, api_key: Option<&str>) -> Self {
        Self {
            user_id: authorization
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(user_id_for_token),
            api_key: api_key.map(str::to_string),
        }
    }

    pub fn rate_limit_key(&self) -> String {
        match (&self.user_id, &self.api_key) {
            (Some(user_id), _) => format!("user:{user_id}"),
            (None, Some(api_key)) => format!("api_key:{api_key}"),
            (None, None) => "anonymous".to_string(),
        }
    }

    /// Enforces the API key when `auth.require_api_key` is set. An empty key
    /// list accepts any key.
    pub fn authorize(&self, auth: &AuthConfig) -> Result<()> {
        if !auth.require_api_key {
            return Ok(());
        }
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TravelAgentError::Authentication("API key required".to_string()))?;
        if !auth.valid_api_keys.is_empty() && !auth.valid_api_keys.iter().any(|k| k == key) {
            return Err(TravelAgentError::Authentication("Invalid API key".to_string()));
        }
        Ok(())
    }
}

fn user_id_for_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    format!("user_{}", u64::from_be_bytes(prefix) % 10_000)
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(Self::from_headers(
            header_str(parts, AUTHORIZATION.as_str()),
            header_str(parts, API_KEY_HEADER),
        ))
    }
}
