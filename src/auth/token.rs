//! Static bearer token authentication

use crate::auth::provider::{AuthHeader, AuthProvider};
use crate::error::AuthError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Sends a fixed service token as `Authorization: Bearer`
#[derive(Clone)]
pub struct BearerTokenProvider {
    token: Arc<str>,
}

impl BearerTokenProvider {
    pub fn new(token: impl Into<String>) -> Result<Self, AuthError> {
        let token = token.into();
        let trimmed = token.trim();

        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(AuthError::InvalidToken);
        }

        Ok(Self {
            token: trimmed.into(),
        })
    }
}

// Never print the token
impl fmt::Debug for BearerTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl AuthProvider for BearerTokenProvider {
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError> {
        Ok(AuthHeader::Bearer(self.token.to_string()))
    }

    fn auth_type(&self) -> &'static str {
        "Bearer token"
    }
}
