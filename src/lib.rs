//! Feature Gate
//!
//! Feature-based access control for an admin dashboard.
//!
//! ## Features
//!
//! - **Feature catalog** discovered from the sidebar menu definition
//! - **Layered resolution**: superadmin, direct overrides, country admin
//!   lists, custom roles and a minimal default set
//! - **One path matcher** shared by the route gate, menu filter and landing
//!   redirect
//! - **Deny by default**: a directory outage never widens access
//!
//! ## Resolution Model
//!
//! ```text
//! superadmin → direct features → country admin list → custom role → default
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [directory]
//! mode = "http"
//! url = "https://api.example.com/api"
//! # token from DIRECTORY_TOKEN env var
//!
//! [menu]
//! path = "menu.toml"
//!
//! [access]
//! superadmin_only = ["partner-assignment", "role-assignment"]
//! ```

pub mod access_control;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod server;

// Re-export main types
pub use access_control::{AccessGate, GateSession, GateState, PermissionResolver, Resolution};
pub use catalog::{FeatureCatalog, MenuTree, filter_menu};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use server::AppState;
