//! Access control module
//!
//! Feature-based access control for the admin dashboard.
//!
//! ## Access Model
//!
//! Every identity resolves to an [`AllowedFeatureSet`] (what it may see) and
//! a [`GrantTable`] (what it may do there). Sources, highest first:
//!
//! 1. **Superadmin** - the whole feature catalog, every action
//! 2. **Direct features** - per-admin override stored on the admin record
//! 3. **Country admin list** - cached snapshot, then the directory; never
//!    includes superadmin-only features
//! 4. **Custom role** - matched by name, case-insensitively
//! 5. **Default set** - `dashboard`
//!
//! A requested path is matched against the set by [`matcher::is_allowed`].
//! The same matcher drives the route gate, the menu filter, the landing
//! redirect and catalog search, so they always agree.
//!
//! ## Example Configuration
//!
//! ```toml
//! [access]
//! superadmin_role = "superadmin"
//! default_features = ["dashboard"]
//! superadmin_only = ["partner-assignment", "role-assignment"]
//!
//! [[directory.roles]]
//! name = "analyst"
//! feature_keys = ["reports"]
//! ```

pub mod gate;
pub mod matcher;
pub mod normalize;
pub mod policy;
pub mod resolver;
pub mod snapshot;
pub mod types;

pub use gate::{AccessGate, GateSession, GateState};
pub use matcher::{first_allowed_feature, is_allowed};
pub use policy::AccessPolicy;
pub use resolver::{PermissionResolver, ProfileOrigin, Resolution, ResolutionSource};
pub use snapshot::IdentitySnapshot;
pub use types::{
    Action, ActionGrant, AdminIdentity, AllowedFeatureSet, CountryAdminProfile, GrantTable, Role,
};
