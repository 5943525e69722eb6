//! Configuration types for feature-gate
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::access_control::types::{AdminIdentity, CountryAdminProfile, Role};
use crate::catalog::MenuSection;
use serde::Deserialize;
use std::collections::HashMap;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Role/admin directory settings
    pub directory: DirectoryConfig,

    /// Access policy
    pub access: AccessConfig,

    /// Menu definition
    pub menu: MenuConfig,

    /// HTTP API settings
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Where role and admin records come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryMode {
    /// Records listed in this configuration
    #[default]
    Static,
    /// Remote directory service over HTTP
    Http,
}

/// Directory configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub mode: DirectoryMode,

    /// Base URL of the directory service (e.g., `https://api.example.com/api`)
    pub url: String,

    /// Bearer token (prefer env var DIRECTORY_TOKEN)
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries for failed requests
    pub max_retries: u32,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,

    /// Endpoint listing all roles
    pub roles_path: String,

    /// Endpoint for a single admin; `{id}` is replaced by the encoded id
    pub admins_path: String,

    /// Endpoint for a country admin's own profile; `{id}` as above
    pub country_admin_path: String,

    /// Static roles (static mode)
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Static admins (static mode)
    #[serde(default)]
    pub admins: Vec<AdminIdentity>,

    /// Static country admin profiles keyed by admin id (static mode)
    #[serde(default)]
    pub country_admins: HashMap<String, CountryAdminProfile>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            mode: DirectoryMode::Static,
            url: String::new(),
            token: None,
            timeout_secs: 10,
            max_retries: 2,
            verify_ssl: true,
            roles_path: "/roles".to_string(),
            admins_path: "/admins/{id}".to_string(),
            country_admin_path: "/country-admins/{id}/self".to_string(),
            roles: Vec::new(),
            admins: Vec::new(),
            country_admins: HashMap::new(),
        }
    }
}

impl DirectoryConfig {
    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Access policy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Protected role holding the whole catalog
    pub superadmin_role: String,

    /// Built-in role that never resolves to an empty set
    pub builtin_admin_role: String,

    /// Features granted when no role or override applies
    pub default_features: Vec<String>,

    /// Features a country admin can never hold
    pub superadmin_only: Vec<String>,

    /// Landing redirect priority
    pub fallback_priority: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            superadmin_role: "superadmin".to_string(),
            builtin_admin_role: "admin".to_string(),
            default_features: vec!["dashboard".to_string()],
            superadmin_only: vec![
                "partner-assignment".to_string(),
                "role-assignment".to_string(),
            ],
            fallback_priority: [
                "dashboard",
                "users",
                "kyc",
                "mt5",
                "deposits",
                "withdrawals",
                "payment-gateways",
                "payment-details",
                "bulk-logs",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Menu configuration
///
/// Either point `path` at a TOML/JSON menu file or list sections inline.
/// A file takes precedence over inline sections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    pub path: Option<String>,

    #[serde(default)]
    pub sections: Vec<MenuSection>,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 20380,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
