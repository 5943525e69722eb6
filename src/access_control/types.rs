//! Access control types
//!
//! Core types used by the access control system.

use crate::access_control::normalize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// CRUD-style action an identity may perform on a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Add,
    Edit,
    Delete,
}

impl Action {
    /// Get the action name as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Add => "add",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }

    /// Try to parse an action from a string
    pub fn try_parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" => Some(Action::View),
            "add" => Some(Action::Add),
            "edit" => Some(Action::Edit),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }

    /// Get all actions
    pub fn all() -> &'static [Action] {
        &[Action::View, Action::Add, Action::Edit, Action::Delete]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-feature action permissions. Everything is denied by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionGrant {
    pub view: bool,
    pub add: bool,
    pub edit: bool,
    pub delete: bool,
}

impl ActionGrant {
    /// Grant with every action permitted
    pub const fn full() -> Self {
        Self {
            view: true,
            add: true,
            edit: true,
            delete: true,
        }
    }

    pub const fn view_only() -> Self {
        Self {
            view: true,
            add: false,
            edit: false,
            delete: false,
        }
    }

    /// Check if this grant permits an action
    pub const fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Add => self.add,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
        }
    }

    pub const fn is_empty(&self) -> bool {
        !(self.view || self.add || self.edit || self.delete)
    }
}

/// Action permissions for every feature of one identity.
///
/// Visibility (the [`AllowedFeatureSet`]) and action permission are
/// independent: a visible feature missing from this table permits nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantTable {
    /// Every action on every feature (superadmin)
    unrestricted: bool,
    grants: BTreeMap<String, ActionGrant>,
}

impl GrantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table that permits every action on every feature
    pub fn unrestricted() -> Self {
        Self {
            unrestricted: true,
            grants: BTreeMap::new(),
        }
    }

    /// Build a table from explicit per-feature grants.
    ///
    /// Keys are stored prefix-stripped so `/admin/deposits` and `deposits`
    /// address the same entry.
    pub fn from_grants<I, K>(grants: I) -> Self
    where
        I: IntoIterator<Item = (K, ActionGrant)>,
        K: AsRef<str>,
    {
        let grants = grants
            .into_iter()
            .map(|(key, grant)| (normalize::strip_prefix(key.as_ref()).to_string(), grant))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self {
            unrestricted: false,
            grants,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted
    }

    /// Look up the grant recorded for a feature or route.
    ///
    /// The stripped path is tried first, then each ancestor up to the
    /// feature key (a parent grant covers its children), then the last
    /// segment.
    pub fn get(&self, feature_key: &str) -> Option<&ActionGrant> {
        let mut path = normalize::strip_prefix(feature_key);
        loop {
            if let Some(grant) = self.grants.get(path) {
                return Some(grant);
            }
            match path.rsplit_once('/') {
                Some((parent, _)) => path = parent,
                None => break,
            }
        }
        self.grants.get(normalize::last_segment(feature_key))
    }

    /// Check whether `action` is permitted on `feature_key`
    pub fn can(&self, feature_key: &str, action: Action) -> bool {
        if self.unrestricted {
            return true;
        }
        self.get(feature_key)
            .is_some_and(|grant| grant.allows(action))
    }

    /// Drop every grant whose key satisfies `reject`
    pub fn remove_where(&mut self, mut reject: impl FnMut(&str) -> bool) {
        self.grants.retain(|key, _| !reject(key));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionGrant)> {
        self.grants.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.unrestricted && self.grants.is_empty()
    }
}

/// Ordered, deduplicated set of feature keys an identity may reach.
///
/// Insertion order is preserved because the landing redirect falls back to
/// the first element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AllowedFeatureSet {
    keys: Vec<String>,
}

impl AllowedFeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, ignoring blanks and duplicates. Returns true if inserted.
    pub fn insert(&mut self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref().trim();
        if key.is_empty() || self.contains(key) {
            return false;
        }
        self.keys.push(key.to_string());
        true
    }

    /// Exact membership (no path matching; see the matcher for that)
    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn first(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.keys.retain(|k| keep(k));
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys as an unordered set, for order-insensitive comparison
    pub fn to_set(&self) -> HashSet<&str> {
        self.iter().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for AllowedFeatureSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl From<Vec<String>> for AllowedFeatureSet {
    fn from(keys: Vec<String>) -> Self {
        keys.into_iter().collect()
    }
}

impl From<AllowedFeatureSet> for Vec<String> {
    fn from(set: AllowedFeatureSet) -> Self {
        set.keys
    }
}

/// A named set of feature keys.
///
/// Built-in and custom roles share this shape; custom roles are owned by the
/// role directory and only read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, alias = "featureKeys", alias = "features")]
    pub feature_keys: Vec<String>,

    #[serde(default, alias = "createdBy")]
    pub created_by: Option<String>,

    #[serde(default, alias = "isProtected")]
    pub is_protected: bool,
}

impl Role {
    pub fn new(name: impl Into<String>, feature_keys: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            feature_keys: feature_keys.iter().map(|k| k.to_string()).collect(),
            created_by: None,
            is_protected: false,
        }
    }

    /// Role names are unique case-insensitively
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// An authenticated admin as known to the admin directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(alias = "roleName", alias = "role")]
    pub role_name: String,

    /// Per-admin feature override; takes precedence over the role
    #[serde(default, alias = "directFeatureKeys", alias = "features")]
    pub direct_feature_keys: Vec<String>,

    #[serde(default, alias = "directGrants", alias = "permissions")]
    pub direct_grants: BTreeMap<String, ActionGrant>,

    #[serde(default, alias = "isCountryAdmin")]
    pub is_country_admin: bool,

    #[serde(default)]
    pub country: Option<String>,
}

impl AdminIdentity {
    pub fn new(id: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role_name: role_name.into(),
            ..Default::default()
        }
    }

    pub fn with_direct_features(mut self, keys: &[&str]) -> Self {
        self.direct_feature_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_grant(mut self, key: impl Into<String>, grant: ActionGrant) -> Self {
        self.direct_grants.insert(key.into(), grant);
        self
    }

    pub fn country_admin(mut self, country: impl Into<String>) -> Self {
        self.is_country_admin = true;
        self.country = Some(country.into());
        self
    }

    pub fn has_direct_features(&self) -> bool {
        self.direct_feature_keys.iter().any(|k| !k.trim().is_empty())
    }
}

/// Feature list a country admin holds according to the directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryAdminProfile {
    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub country: Option<String>,
}
