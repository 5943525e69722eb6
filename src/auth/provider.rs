//! Authentication provider trait

use crate::error::AuthError;
// async_trait required for dyn-compatibility with Box<dyn AuthProvider>
use async_trait::async_trait;

/// Supplies credentials for directory requests.
///
/// Async so that a provider backed by a token endpoint can refresh lazily.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Get the header to attach to the next request
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError>;

    /// Get a description of the auth method (for logging)
    fn auth_type(&self) -> &'static str;
}

/// Authentication header to use with requests
#[derive(Debug, Clone)]
pub enum AuthHeader {
    /// `Authorization: Bearer <token>`
    Bearer(String),
}

impl AuthHeader {
    /// Get the header name for this auth type
    pub fn header_name(&self) -> &'static str {
        match self {
            AuthHeader::Bearer(_) => "Authorization",
        }
    }

    /// Get the header value for this auth type
    pub fn header_value(&self) -> String {
        match self {
            AuthHeader::Bearer(token) => format!("Bearer {}", token),
        }
    }
}

/// Box type alias for auth providers
pub type BoxedAuthProvider = Box<dyn AuthProvider>;
