//! Menu tree definition
//!
//! The sidebar structure owned by the presentation layer: sections hold
//! items, items may hold children. Only the path identifiers matter to
//! access control; labels and icons are carried through untouched.

use crate::access_control::normalize;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Path key of the sign-out entry. Never filtered out.
pub const LOGOUT_KEY: &str = "logout";

/// Complete menu definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuTree {
    #[serde(default)]
    pub sections: Vec<MenuSection>,
}

/// A titled group of sidebar entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSection {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// A sidebar entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Route identifier, e.g. `/admin/deposits/pending`
    #[serde(alias = "id", alias = "route")]
    pub path: String,

    #[serde(default, alias = "name")]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            icon: None,
            children: Vec::new(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_children(mut self, children: Vec<MenuItem>) -> Self {
        self.children = children;
        self
    }

    /// System entries (sign-out) are not assignable features
    pub fn is_system(&self) -> bool {
        normalize::first_segment(&self.path).eq_ignore_ascii_case(LOGOUT_KEY)
    }
}

impl MenuSection {
    pub fn new(title: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }
}

impl MenuTree {
    pub fn new(sections: Vec<MenuSection>) -> Self {
        Self { sections }
    }

    /// Parse a menu from a TOML document with `[[sections]]` tables
    pub fn from_toml_str(source_name: &str, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Menu {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse a menu from JSON: either `{"sections": [...]}` or a bare array of sections
    pub fn from_json_str(source_name: &str, text: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum MenuDocument {
            Tree(MenuTree),
            Sections(Vec<MenuSection>),
        }

        let doc: MenuDocument = serde_json::from_str(text).map_err(|e| ConfigError::Menu {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(match doc {
            MenuDocument::Tree(tree) => tree,
            MenuDocument::Sections(sections) => MenuTree { sections },
        })
    }

    /// Depth-first walk over every item, parents before children
    pub fn walk(&self) -> impl Iterator<Item = &MenuItem> {
        let mut stack: Vec<&MenuItem> = self
            .sections
            .iter()
            .rev()
            .flat_map(|section| section.items.iter().rev())
            .collect();

        std::iter::from_fn(move || {
            let item = stack.pop()?;
            stack.extend(item.children.iter().rev());
            Some(item)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.items.is_empty())
    }
}
