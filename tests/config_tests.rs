//! Configuration loading tests

use feature_gate::config::{DirectoryMode, LogFormat, load_config_from_str, load_menu};
use feature_gate::error::ConfigError;

const MINIMAL_CONFIG: &str = r#"
[directory]
mode = "static"
"#;

const FULL_CONFIG: &str = r#"
[directory]
mode = "http"
url = "https://directory.company.com/api/"
token = "dir-test"
timeout_secs = 30
max_retries = 5
verify_ssl = false
roles_path = "/v2/roles"
admins_path = "/v2/admins/{id}"
country_admin_path = "/v2/country-admins/{id}"

[access]
superadmin_role = "root"
builtin_admin_role = "admin"
default_features = ["dashboard", "reports"]
superadmin_only = ["role-assignment"]
fallback_priority = ["reports", "dashboard"]

[server]
host = "0.0.0.0"
port = 9000

[logging]
level = "debug"
format = "json"
"#;

const STATIC_DIRECTORY_CONFIG: &str = r#"
[[directory.roles]]
name = "analyst"
feature_keys = ["reports"]

[[directory.admins]]
id = "a1"
role_name = "analyst"

[[directory.admins]]
id = "c1"
role_name = "country"
is_country_admin = true
country = "KE"

[directory.admins.direct_grants.deposits]
view = true

[directory.country_admins.c1]
features = ["kyc", "deposits/pending"]
"#;

#[test]
fn test_minimal_config() {
    let config = load_config_from_str(MINIMAL_CONFIG).unwrap();

    assert_eq!(config.directory.mode, DirectoryMode::Static);
    assert_eq!(config.access.superadmin_role, "superadmin");
    assert_eq!(config.access.default_features, vec!["dashboard"]);
    assert_eq!(config.server.port, 20380);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_full_config() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();

    assert_eq!(config.directory.mode, DirectoryMode::Http);
    assert_eq!(config.directory.base_url(), "https://directory.company.com/api");
    assert_eq!(config.directory.token.as_deref(), Some("dir-test"));
    assert_eq!(config.directory.timeout_secs, 30);
    assert_eq!(config.directory.max_retries, 5);
    assert!(!config.directory.verify_ssl);
    assert_eq!(config.directory.admins_path, "/v2/admins/{id}");

    assert_eq!(config.access.superadmin_role, "root");
    assert_eq!(config.access.default_features, vec!["dashboard", "reports"]);
    assert_eq!(config.access.fallback_priority, vec!["reports", "dashboard"]);

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_static_directory_records() {
    let config = load_config_from_str(STATIC_DIRECTORY_CONFIG).unwrap();
    let directory = &config.directory;

    assert_eq!(directory.roles.len(), 1);
    assert_eq!(directory.admins.len(), 2);
    assert!(directory.admins[1].is_country_admin);
    assert!(directory.admins[1].direct_grants.contains_key("deposits"));
    assert_eq!(
        directory.country_admins["c1"].features,
        vec!["kyc", "deposits/pending"]
    );
}

#[test]
fn test_invalid_mode() {
    let config_str = r#"
[directory]
mode = "ldap"
"#;

    assert!(load_config_from_str(config_str).is_err());
}

#[test]
fn test_empty_fallback_priority_rejected() {
    let config_str = r#"
[access]
fallback_priority = []
"#;

    let result = load_config_from_str(config_str);
    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_zero_port_rejected() {
    let config_str = r#"
[server]
port = 0
"#;

    assert!(load_config_from_str(config_str).is_err());
}

#[test]
fn test_menu_from_toml_file() {
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let menu_path = dir.path().join("menu.toml");
    fs::write(
        &menu_path,
        r#"
[[sections]]
title = "Finance"

[[sections.items]]
path = "/admin/deposits"
label = "Deposits"

[[sections.items.children]]
path = "/admin/deposits/pending"
label = "Pending"
"#,
    )
    .unwrap();

    let config_str = format!(
        "[menu]\npath = {:?}\n",
        menu_path.to_str().unwrap()
    );
    let config = load_config_from_str(&config_str).unwrap();
    let menu = load_menu(&config).unwrap();

    assert_eq!(menu.sections.len(), 1);
    assert_eq!(menu.sections[0].items[0].children.len(), 1);
}

#[test]
fn test_menu_from_json_file() {
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let menu_path = dir.path().join("menu.json");
    fs::write(
        &menu_path,
        r#"[{"title": "Main", "items": [{"id": "/admin/kyc", "name": "KYC"}]}]"#,
    )
    .unwrap();

    let config_str = format!(
        "[menu]\npath = {:?}\n",
        menu_path.to_str().unwrap()
    );
    let config = load_config_from_str(&config_str).unwrap();
    let menu = load_menu(&config).unwrap();

    assert_eq!(menu.sections[0].items[0].path, "/admin/kyc");
    assert_eq!(menu.sections[0].items[0].label, "KYC");
}

#[test]
fn test_menu_file_missing() {
    let config = load_config_from_str("[menu]\npath = \"/nonexistent/menu.toml\"\n").unwrap();
    assert!(matches!(load_menu(&config), Err(ConfigError::Io(_))));
}

#[test]
fn test_menu_file_malformed() {
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let menu_path = dir.path().join("menu.json");
    fs::write(&menu_path, "{ not json").unwrap();

    let config_str = format!(
        "[menu]\npath = {:?}\n",
        menu_path.to_str().unwrap()
    );
    let config = load_config_from_str(&config_str).unwrap();

    assert!(matches!(load_menu(&config), Err(ConfigError::Menu { .. })));
}

#[test]
#[serial_test::serial]
fn test_env_var_priority_prefixed_over_directory_token() {
    use feature_gate::config::load_config;
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    // Create a temporary config file without a token
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("test-config.toml");
    let config_content = r#"
[directory]
mode = "http"
url = "https://directory.example.com"
"#;
    fs::write(&config_path, config_content).unwrap();

    // Set both FEATURE_GATE__DIRECTORY__TOKEN and DIRECTORY_TOKEN
    unsafe {
        env::set_var("FEATURE_GATE__DIRECTORY__TOKEN", "prefixed-token");
        env::set_var("DIRECTORY_TOKEN", "plain-token");
    }

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();

    // The prefixed form should take precedence
    assert_eq!(config.directory.token, Some("prefixed-token".to_string()));

    // Cleanup
    unsafe {
        env::remove_var("FEATURE_GATE__DIRECTORY__TOKEN");
        env::remove_var("DIRECTORY_TOKEN");
    }
}

#[test]
#[serial_test::serial]
fn test_env_var_directory_token_fallback() {
    use feature_gate::config::load_config;
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("test-config.toml");
    let config_content = r#"
[directory]
mode = "http"
url = "https://directory.example.com"
token = "file-token"
"#;
    fs::write(&config_path, config_content).unwrap();

    unsafe {
        env::remove_var("FEATURE_GATE__DIRECTORY__TOKEN");
        env::set_var("DIRECTORY_TOKEN", "plain-token");
    }

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();

    // DIRECTORY_TOKEN overrides the file
    assert_eq!(config.directory.token, Some("plain-token".to_string()));

    unsafe {
        env::remove_var("DIRECTORY_TOKEN");
    }
}

#[test]
#[serial_test::serial]
fn test_env_var_nested_override() {
    use feature_gate::config::load_config;
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("test-config.toml");
    fs::write(&config_path, "[server]\nport = 9000\n").unwrap();

    unsafe {
        env::set_var("FEATURE_GATE__SERVER__PORT", "9100");
    }

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();
    assert_eq!(config.server.port, 9100);

    unsafe {
        env::remove_var("FEATURE_GATE__SERVER__PORT");
    }
}

#[test]
#[serial_test::serial]
fn test_explicit_config_path_must_exist() {
    use feature_gate::config::load_config;

    let result = load_config(Some("/nonexistent/feature-gate.toml"));
    assert!(matches!(result, Err(ConfigError::Load(_))));
}
