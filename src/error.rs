//! Error types for feature-gate
//!
//! This module defines the error hierarchy used throughout the crate.
//! Directory and configuration failures are `thiserror` enums; resolution
//! problems are carried as [`ResolveIssue`] values inside a resolution
//! instead of being propagated, because no lookup failure may abort access
//! resolution.

use serde::Serialize;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid menu definition in '{source_name}': {reason}")]
    Menu { source_name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Role/admin directory errors
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Directory API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Unauthorized: invalid or expired directory token")]
    Unauthorized,

    #[error("Forbidden: insufficient permissions for {action}")]
    Forbidden { action: String },

    #[error("Invalid response from directory: {0}")]
    InvalidResponse(String),

    #[error("Request timeout after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

impl DirectoryError {
    /// Create an appropriate error from an HTTP status code and response body
    pub fn from_response(status: u16, body: &str) -> Self {
        match status {
            401 => DirectoryError::Unauthorized,
            403 => DirectoryError::Forbidden {
                action: "this lookup".into(),
            },
            404 => DirectoryError::NotFound {
                resource: "requested record".into(),
            },
            429 => DirectoryError::RateLimited { retry_after: 60 },
            _ => DirectoryError::Api {
                status,
                message: if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }
}

/// Credential errors for the directory client
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid token format")]
    InvalidToken,
}

/// Which external source a resolution step consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupSource {
    RoleDirectory,
    AdminDirectory,
    CountryAdminDirectory,
}

impl std::fmt::Display for LookupSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LookupSource::RoleDirectory => "role directory",
            LookupSource::AdminDirectory => "admin directory",
            LookupSource::CountryAdminDirectory => "country admin directory",
        };
        f.write_str(name)
    }
}

/// A non-fatal problem met while resolving an identity.
///
/// The resolver records these and continues with the next-lower source.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveIssue {
    #[error("{lookup} unavailable: {reason}")]
    SourceUnavailable { lookup: LookupSource, reason: String },

    #[error("cached identity snapshot is malformed: {reason}")]
    MalformedSnapshot { reason: String },

    #[error("role '{role}' matches no built-in or custom role")]
    UnknownRole { role: String },
}

impl ResolveIssue {
    pub fn unavailable(lookup: LookupSource, err: impl std::fmt::Display) -> Self {
        ResolveIssue::SourceUnavailable {
            lookup,
            reason: err.to_string(),
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for directory lookups
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;
