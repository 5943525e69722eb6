//! Directory authentication
//!
//! Credentials attached to every request the HTTP directory client makes.
//! A directory without a configured token is called anonymously.

pub mod provider;
pub mod token;

pub use provider::{AuthHeader, AuthProvider, BoxedAuthProvider};
pub use token::BearerTokenProvider;

use crate::config::DirectoryConfig;
use crate::error::AuthError;

/// Create an auth provider from configuration.
///
/// Returns `Ok(None)` when no token is configured.
pub fn create_auth_provider(
    config: &DirectoryConfig,
) -> Result<Option<BoxedAuthProvider>, AuthError> {
    match config.token.as_deref() {
        Some(token) => Ok(Some(Box::new(BearerTokenProvider::new(token)?))),
        None => Ok(None),
    }
}
