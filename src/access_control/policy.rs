//! Access policy constants
//!
//! Role names with built-in meaning, the superadmin-only deny-list, the
//! default feature set and the landing redirect priority. Loaded from the
//! `[access]` configuration section.

use crate::access_control::normalize;
use crate::access_control::types::AllowedFeatureSet;
use crate::config::AccessConfig;

/// Compiled access policy
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    superadmin_role: String,
    builtin_admin_role: String,
    default_features: AllowedFeatureSet,
    superadmin_only: Vec<String>,
    fallback_priority: Vec<String>,
}

impl AccessPolicy {
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            superadmin_role: config.superadmin_role.trim().to_string(),
            builtin_admin_role: config.builtin_admin_role.trim().to_string(),
            default_features: config.default_features.iter().collect(),
            superadmin_only: config
                .superadmin_only
                .iter()
                .map(|k| normalize::strip_prefix(k).to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            fallback_priority: config.fallback_priority.clone(),
        }
    }

    pub fn is_superadmin(&self, role_name: &str) -> bool {
        role_name.trim().eq_ignore_ascii_case(&self.superadmin_role)
    }

    pub fn is_builtin_admin(&self, role_name: &str) -> bool {
        role_name.trim().eq_ignore_ascii_case(&self.builtin_admin_role)
    }

    /// Set granted when no other source applies
    pub fn default_features(&self) -> &AllowedFeatureSet {
        &self.default_features
    }

    pub fn superadmin_only(&self) -> &[String] {
        &self.superadmin_only
    }

    pub fn fallback_priority(&self) -> &[String] {
        &self.fallback_priority
    }

    /// Landing target when nothing else is allowed
    pub fn default_landing(&self) -> &str {
        self.fallback_priority
            .first()
            .map(String::as_str)
            .or_else(|| self.default_features.first())
            .unwrap_or("dashboard")
    }

    /// Check whether a feature path falls under the superadmin-only deny-list.
    ///
    /// The full path, its first segment and its normalized key are all
    /// checked, so `role-assignment/edit` is caught by `role-assignment`.
    pub fn is_superadmin_only(&self, key: &str) -> bool {
        let stripped = normalize::strip_prefix(key);
        let first = normalize::first_segment(key);
        let normalized = normalize::normalize(key);
        self.superadmin_only
            .iter()
            .any(|denied| denied == stripped || denied == first || *denied == normalized)
    }

    /// Remove superadmin-only features from a set
    pub fn strip_superadmin_only(&self, set: &mut AllowedFeatureSet) {
        set.retain(|key| !self.is_superadmin_only(key));
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(&AccessConfig::default())
    }
}
