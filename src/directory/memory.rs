//! In-memory directory
//!
//! Serves role, admin and country-admin records held in memory, typically
//! loaded from the `[directory]` configuration section.

use crate::access_control::types::{AdminIdentity, CountryAdminProfile, Role};
use crate::config::DirectoryConfig;
use crate::directory::{AdminDirectory, CountryAdminDirectory, RoleDirectory};
use crate::error::{DirectoryError, DirectoryResult};
use async_trait::async_trait;
use std::collections::HashMap;

/// Directory backed by fixed records
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    roles: Vec<Role>,
    admins: HashMap<String, AdminIdentity>,
    country_admins: HashMap<String, CountryAdminProfile>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DirectoryConfig) -> Self {
        let mut directory = Self::new();
        for role in &config.roles {
            directory = directory.with_role(role.clone());
        }
        for admin in &config.admins {
            directory = directory.with_admin(admin.clone());
        }
        for (id, profile) in &config.country_admins {
            directory = directory.with_country_admin(id.clone(), profile.clone());
        }
        directory
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_admin(mut self, admin: AdminIdentity) -> Self {
        self.admins.insert(admin.id.clone(), admin);
        self
    }

    pub fn with_country_admin(
        mut self,
        admin_id: impl Into<String>,
        profile: CountryAdminProfile,
    ) -> Self {
        self.country_admins.insert(admin_id.into(), profile);
        self
    }
}

#[async_trait]
impl RoleDirectory for StaticDirectory {
    async fn list_roles(&self) -> DirectoryResult<Vec<Role>> {
        Ok(self.roles.clone())
    }
}

#[async_trait]
impl AdminDirectory for StaticDirectory {
    async fn get_admin(&self, id: &str) -> DirectoryResult<AdminIdentity> {
        self.admins
            .get(id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound {
                resource: format!("admin '{}'", id),
            })
    }
}

#[async_trait]
impl CountryAdminDirectory for StaticDirectory {
    async fn get_self(&self, admin_id: &str) -> DirectoryResult<CountryAdminProfile> {
        self.country_admins
            .get(admin_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound {
                resource: format!("country admin profile '{}'", admin_id),
            })
    }
}
