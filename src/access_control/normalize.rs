//! Feature path normalization
//!
//! Every feature path that enters the crate (menu identifiers, role feature
//! lists, requested routes) goes through these functions. Paths may arrive
//! as `/admin/deposits/pending`, `/deposits/pending`, `deposits/pending` or
//! the bare key `pending`.

const ADMIN_PREFIX: &str = "/admin/";

/// Strip the routing prefix and surrounding whitespace, keeping all segments.
///
/// A leading `/admin/` is removed if present, otherwise a single leading `/`.
pub fn strip_prefix(raw: &str) -> &str {
    let rest = raw
        .strip_prefix(ADMIN_PREFIX)
        .or_else(|| raw.strip_prefix('/'))
        .unwrap_or(raw);
    rest.trim()
}

/// Reduce any path representation to its canonical feature key.
///
/// Returns the last `/`-delimited segment of the stripped path, so
/// `deposits/approved` collapses to `approved`. Callers that need
/// parent-aware matching must use [`segments`] on the unnormalized path.
pub fn normalize(raw: &str) -> String {
    let stripped = strip_prefix(raw);
    match stripped.rsplit_once('/') {
        Some((_, last)) => last.to_string(),
        None => stripped.to_string(),
    }
}

/// Split a stripped path into its `/`-delimited segments.
pub fn segments(raw: &str) -> Vec<&str> {
    strip_prefix(raw).split('/').collect()
}

/// First segment of a stripped path (the catalog key of a menu node).
pub fn first_segment(raw: &str) -> &str {
    let stripped = strip_prefix(raw);
    stripped.split('/').next().unwrap_or(stripped).trim()
}

/// Last segment of a stripped path.
pub fn last_segment(raw: &str) -> &str {
    let stripped = strip_prefix(raw);
    stripped.rsplit('/').next().unwrap_or(stripped).trim()
}
