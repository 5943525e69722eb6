//! Cached identity snapshots
//!
//! Clients cache the signed-in admin record after login. For country admins
//! that cached record is consulted before the directory. It is untrusted
//! input: anything that does not parse is treated as absent.

use crate::error::ResolveIssue;
use serde::Deserialize;

/// The parts of a cached admin record the resolver reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentitySnapshot {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub features: Option<Vec<String>>,
}

impl IdentitySnapshot {
    /// Parse a cached record; `{"admin": {...}}` wrappers are accepted
    pub fn parse(raw: &str) -> Result<Self, ResolveIssue> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Document {
            Wrapped { admin: IdentitySnapshot },
            Plain(IdentitySnapshot),
        }

        let doc: Document =
            serde_json::from_str(raw).map_err(|e| ResolveIssue::MalformedSnapshot {
                reason: e.to_string(),
            })?;

        Ok(match doc {
            Document::Wrapped { admin } => admin,
            Document::Plain(snapshot) => snapshot,
        })
    }

    /// Feature list usable for `admin_id`.
    ///
    /// `None` when the snapshot carries no features or belongs to someone else.
    pub fn features_for(&self, admin_id: &str) -> Option<&[String]> {
        if let Some(id) = &self.id
            && id != admin_id
        {
            return None;
        }

        self.features
            .as_deref()
            .filter(|features| features.iter().any(|f| !f.trim().is_empty()))
    }
}
