//! Permission resolver
//!
//! Turns an admin identity into the set of features it may reach, with the
//! following precedence (first satisfied source wins):
//! 1. Superadmin role: the whole catalog, every action
//! 2. Per-admin direct feature keys
//! 3. Country admin feature list (cached snapshot, then directory)
//! 4. Custom role, matched case-insensitively, restricted to the catalog
//! 5. The default set
//!
//! No lookup failure aborts resolution. Each one is recorded as a
//! [`ResolveIssue`] and resolution continues with the next-lower source.

use crate::access_control::matcher;
use crate::access_control::normalize;
use crate::access_control::policy::AccessPolicy;
use crate::access_control::snapshot::IdentitySnapshot;
use crate::access_control::types::{Action, AdminIdentity, AllowedFeatureSet, GrantTable};
use crate::catalog::{Feature, FeatureCatalog};
use crate::directory::Directories;
use crate::error::{LookupSource, ResolveIssue};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

/// Where a country admin's feature list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileOrigin {
    Snapshot,
    Directory,
}

/// Which rule produced a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionSource {
    Superadmin,
    Direct,
    CountryAdmin { origin: ProfileOrigin },
    CustomRole { name: String },
    Default,
    /// Nothing could be established; the set is empty
    Denied,
}

/// Outcome of resolving one identity. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub features: AllowedFeatureSet,
    pub grants: GrantTable,
    pub source: ResolutionSource,
    pub issues: Vec<ResolveIssue>,
}

impl Resolution {
    fn denied(issues: Vec<ResolveIssue>) -> Self {
        Self {
            features: AllowedFeatureSet::new(),
            grants: GrantTable::new(),
            source: ResolutionSource::Denied,
            issues,
        }
    }

    /// Check whether `path` is visible under this resolution
    pub fn is_allowed(&self, path: &str) -> bool {
        matcher::is_allowed(path, &self.features)
    }

    /// Check whether `action` is permitted on `feature_key`
    pub fn can(&self, feature_key: &str, action: Action) -> bool {
        self.grants.can(feature_key, action)
    }
}

/// Resolves identities against the catalog and the directories
pub struct PermissionResolver {
    catalog: Arc<FeatureCatalog>,
    policy: AccessPolicy,
    directories: Directories,
}

impl PermissionResolver {
    pub fn new(catalog: Arc<FeatureCatalog>, policy: AccessPolicy, directories: Directories) -> Self {
        Self {
            catalog,
            policy,
            directories,
        }
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Every feature in the catalog (the superadmin set)
    pub fn all_catalog_features(&self) -> AllowedFeatureSet {
        self.catalog.keys()
    }

    /// Features `caller` may hand out in the role editor
    pub fn assignable_features(&self, caller: &AdminIdentity) -> Vec<&Feature> {
        self.catalog
            .assignable(caller.is_country_admin, self.policy.superadmin_only())
    }

    /// Resolve an identity without a cached snapshot
    pub async fn resolve(&self, identity: &AdminIdentity) -> Resolution {
        self.resolve_with_snapshot(identity, None).await
    }

    /// Resolve an identity.
    ///
    /// `snapshot` is the client's cached admin record, consulted before the
    /// country admin directory.
    #[instrument(
        skip(self, identity, snapshot),
        fields(admin = %identity.id, role = %identity.role_name)
    )]
    pub async fn resolve_with_snapshot(
        &self,
        identity: &AdminIdentity,
        snapshot: Option<&str>,
    ) -> Resolution {
        if self.policy.is_superadmin(&identity.role_name) {
            debug!("Superadmin holds the whole catalog");
            return Resolution {
                features: self.catalog.keys(),
                grants: GrantTable::unrestricted(),
                source: ResolutionSource::Superadmin,
                issues: Vec::new(),
            };
        }

        let mut issues = Vec::new();

        let (mut features, source) = if identity.has_direct_features() {
            trace!("Using direct feature keys");
            (
                identity
                    .direct_feature_keys
                    .iter()
                    .map(|key| normalize::strip_prefix(key))
                    .collect(),
                ResolutionSource::Direct,
            )
        } else {
            let country = if identity.is_country_admin {
                self.country_admin_features(identity, snapshot, &mut issues)
                    .await
            } else {
                None
            };

            match country {
                Some((features, origin)) => (features, ResolutionSource::CountryAdmin { origin }),
                None => self.role_features(identity, &mut issues).await,
            }
        };

        let mut grants = GrantTable::from_grants(
            identity
                .direct_grants
                .iter()
                .map(|(key, grant)| (key, *grant)),
        );

        if identity.is_country_admin {
            self.policy.strip_superadmin_only(&mut features);
            grants.remove_where(|key| self.policy.is_superadmin_only(key));
        }

        for issue in &issues {
            warn!(issue = %issue, "Resolution degraded");
        }

        debug!(
            features = features.len(),
            source = ?source,
            issues = issues.len(),
            "Resolved identity"
        );

        Resolution {
            features,
            grants,
            source,
            issues,
        }
    }

    /// Fetch an identity from the admin directory, then resolve it
    #[instrument(skip(self))]
    pub async fn resolve_by_id(&self, id: &str) -> Resolution {
        match self.directories.admins.get_admin(id).await {
            Ok(identity) => self.resolve(&identity).await,
            Err(e) => {
                let issue = ResolveIssue::unavailable(LookupSource::AdminDirectory, e);
                warn!(issue = %issue, "Admin lookup failed, denying");
                Resolution::denied(vec![issue])
            }
        }
    }

    /// The country admin's own list, normalized. `None` sends resolution on
    /// to the role lookup.
    async fn country_admin_features(
        &self,
        identity: &AdminIdentity,
        snapshot: Option<&str>,
        issues: &mut Vec<ResolveIssue>,
    ) -> Option<(AllowedFeatureSet, ProfileOrigin)> {
        if let Some(raw) = snapshot {
            match IdentitySnapshot::parse(raw) {
                Ok(snapshot) => {
                    if let Some(features) = snapshot.features_for(&identity.id) {
                        trace!("Using cached identity snapshot");
                        return Some((self.country_admin_set(features), ProfileOrigin::Snapshot));
                    }
                    trace!("Snapshot carries no usable feature list");
                }
                Err(issue) => issues.push(issue),
            }
        }

        match self.directories.country_admins.get_self(&identity.id).await {
            Ok(profile) if profile.features.iter().any(|f| !f.trim().is_empty()) => {
                Some((self.country_admin_set(&profile.features), ProfileOrigin::Directory))
            }
            Ok(_) => {
                debug!("Country admin profile lists no features");
                None
            }
            Err(e) => {
                issues.push(ResolveIssue::unavailable(LookupSource::CountryAdminDirectory, e));
                None
            }
        }
    }

    /// Custom role lookup with the default and deny-by-default fallbacks
    async fn role_features(
        &self,
        identity: &AdminIdentity,
        issues: &mut Vec<ResolveIssue>,
    ) -> (AllowedFeatureSet, ResolutionSource) {
        let is_builtin_admin = self.policy.is_builtin_admin(&identity.role_name);

        let roles = match self.directories.roles.list_roles().await {
            Ok(roles) => roles,
            Err(e) => {
                issues.push(ResolveIssue::unavailable(LookupSource::RoleDirectory, e));
                if is_builtin_admin {
                    return (self.policy.default_features().clone(), ResolutionSource::Default);
                }
                return (AllowedFeatureSet::new(), ResolutionSource::Denied);
            }
        };

        let role = roles.iter().find(|role| {
            role.matches_name(&identity.role_name) && !self.policy.is_superadmin(&role.name)
        });

        match role {
            Some(role) => {
                trace!(role = %role.name, "Matched custom role");
                (
                    self.restrict_to_catalog(&role.feature_keys),
                    ResolutionSource::CustomRole {
                        name: role.name.clone(),
                    },
                )
            }
            None => {
                if !is_builtin_admin {
                    issues.push(ResolveIssue::UnknownRole {
                        role: identity.role_name.clone(),
                    });
                }
                (self.policy.default_features().clone(), ResolutionSource::Default)
            }
        }
    }

    /// Normalize a country admin's raw list.
    ///
    /// Deny-listed entries are dropped while their full path is still known;
    /// `/admin/role-assignment/edit` would otherwise collapse to `edit`.
    fn country_admin_set(&self, keys: &[String]) -> AllowedFeatureSet {
        keys.iter()
            .filter(|key| {
                let denied = self.policy.is_superadmin_only(key);
                if denied {
                    debug!(key = %key, "Dropping superadmin-only entry");
                }
                !denied
            })
            .map(|key| normalize::normalize(key))
            .collect()
    }

    /// Keep only keys whose feature exists in the catalog
    fn restrict_to_catalog(&self, keys: &[String]) -> AllowedFeatureSet {
        keys.iter()
            .filter(|key| {
                let known = self.catalog.contains(normalize::first_segment(key));
                if !known && !key.trim().is_empty() {
                    warn!(key = %key, "Role grants a feature missing from the catalog");
                }
                known
            })
            .collect()
    }
}
