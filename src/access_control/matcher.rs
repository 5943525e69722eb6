//! Feature matching
//!
//! The single decision function shared by the route gate, the menu filter,
//! the landing redirect and catalog search.
//!
//! A requested path is allowed by a granted key if any of these hold:
//!
//! 1. the stripped values are equal;
//! 2. their last segments are equal, or one full value equals the other's
//!    last segment;
//! 3. the grant is a single segment equal to the request's first segment
//!    (a parent grant implies all of its children);
//! 4. one value is a prefix of the other ending on a `/` boundary.
//!
//! Every rule is independently sufficient, so rule order only decides how
//! early the check short-circuits.

use crate::access_control::normalize;
use crate::access_control::types::AllowedFeatureSet;
use tracing::trace;

/// Which rule produced an allow decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Exact,
    LastSegment,
    ParentGrant,
    BoundaryPrefix,
}

/// Check whether a single granted key authorizes a requested path
pub fn match_rule(requested: &str, granted: &str) -> Option<MatchRule> {
    let req = normalize::strip_prefix(requested);
    let grant = normalize::strip_prefix(granted);

    if req.is_empty() || grant.is_empty() {
        return None;
    }

    if req == grant {
        return Some(MatchRule::Exact);
    }

    let req_last = normalize::last_segment(req);
    let grant_last = normalize::last_segment(grant);
    if grant_last == req_last || grant == req_last || req == grant_last {
        return Some(MatchRule::LastSegment);
    }

    if !grant.contains('/') && grant == normalize::first_segment(req) {
        return Some(MatchRule::ParentGrant);
    }

    if is_boundary_prefix(grant, req) || is_boundary_prefix(req, grant) {
        return Some(MatchRule::BoundaryPrefix);
    }

    None
}

/// `prefix` followed by `/` starts `path`; `users` never prefixes `users-export`
fn is_boundary_prefix(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Check whether any key in `allowed` authorizes `requested`
pub fn is_allowed(requested: &str, allowed: &AllowedFeatureSet) -> bool {
    find_grant(requested, allowed).is_some()
}

/// Return the first granted key that authorizes `requested`, with the rule used
pub fn find_grant<'a>(
    requested: &str,
    allowed: &'a AllowedFeatureSet,
) -> Option<(&'a str, MatchRule)> {
    let found = allowed
        .iter()
        .find_map(|granted| match_rule(requested, granted).map(|rule| (granted, rule)));

    if let Some((granted, rule)) = found {
        trace!(requested, granted, ?rule, "Feature matched");
    }
    found
}

/// First entry of `priority` the set allows, else the set's first key,
/// else `default`.
pub fn first_allowed_feature(
    allowed: &AllowedFeatureSet,
    priority: &[String],
    default: &str,
) -> String {
    priority
        .iter()
        .find(|candidate| is_allowed(candidate, allowed))
        .map(|candidate| candidate.to_string())
        .or_else(|| allowed.first().map(str::to_string))
        .unwrap_or_else(|| default.to_string())
}
