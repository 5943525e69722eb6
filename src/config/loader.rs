//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (FEATURE_GATE__*)
//! 2. Well-known variables (DIRECTORY_URL, DIRECTORY_TOKEN), unless the
//!    prefixed form of the same setting is present
//! 3. Configuration file (TOML)
//! 4. Default values

use crate::catalog::MenuTree;
use crate::config::types::{AppConfig, DirectoryMode};
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "feature-gate.toml",
    ".feature-gate.toml",
    "~/.config/feature-gate/config.toml",
    "/etc/feature-gate/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                debug!(path = %expanded, "Using configuration file");
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // Well-known variables apply unless the prefixed form is set
    for (env_var, prefixed, key) in [
        ("DIRECTORY_URL", "FEATURE_GATE__DIRECTORY__URL", "directory.url"),
        ("DIRECTORY_TOKEN", "FEATURE_GATE__DIRECTORY__TOKEN", "directory.token"),
    ] {
        if std::env::var(prefixed).is_ok() {
            continue;
        }
        if let Ok(value) = std::env::var(env_var) {
            builder = builder
                .set_override(key, value)
                .map_err(|e| ConfigError::Load(e.to_string()))?;
        }
    }

    // e.g., FEATURE_GATE__DIRECTORY__URL, FEATURE_GATE__SERVER__PORT
    // Double underscore (__) maps to nested keys (directory.url)
    builder = builder.add_source(
        Environment::with_prefix("FEATURE_GATE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Resolve the menu tree named by the configuration.
///
/// A `menu.path` file wins over inline `[[menu.sections]]`. The file format
/// is chosen by extension (`.json`, otherwise TOML).
pub fn load_menu(config: &AppConfig) -> Result<MenuTree, ConfigError> {
    let Some(path) = config.menu.path.as_deref() else {
        return Ok(MenuTree::new(config.menu.sections.clone()));
    };

    let expanded = shellexpand::tilde(path);
    let text = std::fs::read_to_string(expanded.as_ref())?;

    let is_json = Path::new(expanded.as_ref())
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let menu = if is_json {
        MenuTree::from_json_str(path, &text)?
    } else {
        MenuTree::from_toml_str(path, &text)?
    };

    debug!(path, sections = menu.sections.len(), "Loaded menu definition");
    Ok(menu)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let directory = &config.directory;

    if directory.mode == DirectoryMode::Http {
        if directory.url.is_empty() {
            return Err(ConfigError::Missing {
                field: "directory.url (set DIRECTORY_URL environment variable)".to_string(),
            });
        }

        if !directory.url.starts_with("http://") && !directory.url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                message: format!(
                    "directory.url must start with http:// or https://, got: {}",
                    directory.url
                ),
            });
        }

        for (field, value) in [
            ("directory.admins_path", &directory.admins_path),
            ("directory.country_admin_path", &directory.country_admin_path),
        ] {
            if !value.contains("{id}") {
                return Err(ConfigError::Invalid {
                    message: format!("{} must contain an {{id}} placeholder", field),
                });
            }
        }
    }

    if directory.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "directory.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if config.access.superadmin_role.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "access.superadmin_role".to_string(),
        });
    }

    if config.access.default_features.iter().all(|k| k.trim().is_empty()) {
        return Err(ConfigError::Invalid {
            message: "access.default_features must name at least one feature".to_string(),
        });
    }

    if config.access.fallback_priority.is_empty() {
        return Err(ConfigError::Invalid {
            message: "access.fallback_priority must not be empty".to_string(),
        });
    }

    // Role names are unique case-insensitively
    let roles = &directory.roles;
    for (i, role) in roles.iter().enumerate() {
        if roles[..i].iter().any(|other| other.matches_name(&role.name)) {
            return Err(ConfigError::Invalid {
                message: format!("duplicate role name: {}", role.name),
            });
        }
    }

    Ok(())
}
