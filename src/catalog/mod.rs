//! Feature catalog
//!
//! The universe of assignable features, derived from the menu definition.
//! A superadmin implicitly holds every feature in the catalog; the role
//! editor offers the catalog (minus superadmin-only entries for country
//! admins) as the list of assignable features.

pub mod filter;
pub mod menu;

pub use filter::filter_menu;
pub use menu::{LOGOUT_KEY, MenuItem, MenuSection, MenuTree};

use crate::access_control::matcher;
use crate::access_control::normalize;
use crate::access_control::types::AllowedFeatureSet;
use serde::Serialize;
use tracing::debug;

/// An addressable capability, keyed by its first route segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub key: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Deduplicated features in order of first discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureCatalog {
    features: Vec<Feature>,
}

impl FeatureCatalog {
    /// Build the catalog from a menu tree.
    ///
    /// Every node, children included, contributes the first segment of its
    /// path. The first node seen for a key names the feature.
    pub fn from_menu(menu: &MenuTree) -> Self {
        let mut features: Vec<Feature> = Vec::new();

        for item in menu.walk() {
            if item.is_system() {
                continue;
            }

            let key = normalize::first_segment(&item.path);
            if key.is_empty() || features.iter().any(|f| f.key == key) {
                continue;
            }

            features.push(Feature {
                key: key.to_string(),
                display_name: if item.label.is_empty() {
                    key.to_string()
                } else {
                    item.label.clone()
                },
                icon: item.icon.clone(),
            });
        }

        debug!(features = features.len(), "Built feature catalog");
        Self { features }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Catalog keys as a feature set (the superadmin set)
    pub fn keys(&self) -> AllowedFeatureSet {
        self.features.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.features.iter().any(|f| f.key == key)
    }

    /// Features a role editor may offer.
    ///
    /// Country admins cannot hand out features on the superadmin-only list.
    pub fn assignable(
        &self,
        caller_is_country_admin: bool,
        superadmin_only: &[String],
    ) -> Vec<&Feature> {
        self.features
            .iter()
            .filter(|f| {
                !caller_is_country_admin
                    || !superadmin_only.iter().any(|denied| denied == &f.key)
            })
            .collect()
    }

    /// Look features up by route or name.
    ///
    /// A feature matches when the shared matcher relates its key to the
    /// query, or its display name contains the query (case-insensitive).
    pub fn search(&self, query: &str) -> Vec<&Feature> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let as_set: AllowedFeatureSet = [query].into_iter().collect();
        let lowered = query.to_lowercase();

        self.features
            .iter()
            .filter(|f| {
                matcher::is_allowed(&f.key, &as_set)
                    || f.display_name.to_lowercase().contains(&lowered)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
