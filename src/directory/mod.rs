//! Role and admin directories
//!
//! The resolver reads role definitions, admin records and country-admin
//! profiles through these traits. It never writes to them. Two
//! implementations are provided: [`StaticDirectory`] (records from
//! configuration) and [`HttpDirectory`] (a remote directory service).

pub mod client;
pub mod memory;

pub use client::HttpDirectory;
pub use memory::StaticDirectory;

use crate::access_control::types::{AdminIdentity, CountryAdminProfile, Role};
use crate::auth::create_auth_provider;
use crate::config::{DirectoryConfig, DirectoryMode};
use crate::error::{AppError, DirectoryResult};
// async_trait required for dyn-compatibility with Arc<dyn RoleDirectory>
use async_trait::async_trait;
use std::sync::Arc;

/// Source of built-in and custom role definitions
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn list_roles(&self) -> DirectoryResult<Vec<Role>>;
}

/// Source of admin records, including per-admin feature overrides
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn get_admin(&self, id: &str) -> DirectoryResult<AdminIdentity>;
}

/// Source of a country admin's own feature list
#[async_trait]
pub trait CountryAdminDirectory: Send + Sync {
    async fn get_self(&self, admin_id: &str) -> DirectoryResult<CountryAdminProfile>;
}

/// The three directory handles a resolver needs
#[derive(Clone)]
pub struct Directories {
    pub roles: Arc<dyn RoleDirectory>,
    pub admins: Arc<dyn AdminDirectory>,
    pub country_admins: Arc<dyn CountryAdminDirectory>,
}

impl Directories {
    /// Use one value for all three directories
    pub fn from_shared<D>(directory: Arc<D>) -> Self
    where
        D: RoleDirectory + AdminDirectory + CountryAdminDirectory + 'static,
    {
        Self {
            roles: directory.clone(),
            admins: directory.clone(),
            country_admins: directory,
        }
    }

    /// Build the directories named by configuration
    pub fn from_config(config: &DirectoryConfig) -> Result<Self, AppError> {
        match config.mode {
            DirectoryMode::Static => Ok(Self::from_shared(Arc::new(
                StaticDirectory::from_config(config),
            ))),
            DirectoryMode::Http => {
                let auth = create_auth_provider(config)?;
                let client = HttpDirectory::new(config, auth)?;
                Ok(Self::from_shared(Arc::new(client)))
            }
        }
    }
}
