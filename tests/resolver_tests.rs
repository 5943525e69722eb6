//! Permission resolver integration tests
//!
//! Exercises the resolution fallback chain against in-memory, failing and
//! slow directories, and the gate session's stale-result suppression.

use async_trait::async_trait;
use feature_gate::access_control::{
    AccessGate, AccessPolicy, Action, ActionGrant, AdminIdentity, CountryAdminProfile,
    GateSession, GateState, PermissionResolver, ProfileOrigin, ResolutionSource, Role,
};
use feature_gate::catalog::{FeatureCatalog, MenuItem, MenuSection, MenuTree, filter_menu};
use feature_gate::directory::{
    AdminDirectory, CountryAdminDirectory, Directories, RoleDirectory, StaticDirectory,
};
use feature_gate::error::{DirectoryError, DirectoryResult, LookupSource, ResolveIssue};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// =============================================================================
// Test Helpers
// =============================================================================

fn menu() -> MenuTree {
    MenuTree::new(vec![
        MenuSection::new(
            "Main",
            vec![
                MenuItem::new("/admin/dashboard", "Dashboard"),
                MenuItem::new("/admin/reports", "Reports"),
                MenuItem::new("/admin/users", "Users"),
                MenuItem::new("/admin/kyc", "KYC"),
                MenuItem::new("/admin/deposits", "Deposits").with_children(vec![
                    MenuItem::new("/admin/deposits/pending", "Pending"),
                    MenuItem::new("/admin/deposits/approved", "Approved"),
                ]),
            ],
        ),
        MenuSection::new(
            "Administration",
            vec![
                MenuItem::new("/admin/role-assignment", "Roles"),
                MenuItem::new("/admin/partner-assignment", "Partners"),
            ],
        ),
        MenuSection::new("Account", vec![MenuItem::new("/admin/logout", "Logout")]),
    ])
}

fn resolver_with(directories: Directories) -> PermissionResolver {
    PermissionResolver::new(
        Arc::new(FeatureCatalog::from_menu(&menu())),
        AccessPolicy::default(),
        directories,
    )
}

fn resolver(directory: StaticDirectory) -> PermissionResolver {
    resolver_with(Directories::from_shared(Arc::new(directory)))
}

fn keys(features: &feature_gate::access_control::AllowedFeatureSet) -> Vec<&str> {
    features.iter().collect()
}

/// Directory whose every lookup fails as if the service were down
struct UnreachableDirectory;

fn outage() -> DirectoryError {
    DirectoryError::Api {
        status: 503,
        message: "Service unavailable".to_string(),
    }
}

#[async_trait]
impl RoleDirectory for UnreachableDirectory {
    async fn list_roles(&self) -> DirectoryResult<Vec<Role>> {
        Err(outage())
    }
}

#[async_trait]
impl AdminDirectory for UnreachableDirectory {
    async fn get_admin(&self, _id: &str) -> DirectoryResult<AdminIdentity> {
        Err(outage())
    }
}

#[async_trait]
impl CountryAdminDirectory for UnreachableDirectory {
    async fn get_self(&self, _admin_id: &str) -> DirectoryResult<CountryAdminProfile> {
        Err(outage())
    }
}

/// Role directory that stalls on its first call only
struct StallFirstCall {
    calls: AtomicUsize,
    roles: Vec<Role>,
}

#[async_trait]
impl RoleDirectory for StallFirstCall {
    async fn list_roles(&self) -> DirectoryResult<Vec<Role>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        Ok(self.roles.clone())
    }
}

// =============================================================================
// 1. Fallback chain
// =============================================================================

#[tokio::test]
async fn test_superadmin_resolves_to_exactly_the_catalog() {
    let resolver = resolver(StaticDirectory::new());
    let resolution = resolver
        .resolve(&AdminIdentity::new("root", "superadmin"))
        .await;

    let catalog = resolver.catalog().keys();
    assert_eq!(resolution.features.to_set(), catalog.to_set());
    assert_eq!(resolution.features.len(), catalog.len());
    assert!(resolution.grants.is_unrestricted());
}

#[tokio::test]
async fn test_superadmin_never_consults_directories() {
    let resolver = resolver_with(Directories::from_shared(Arc::new(UnreachableDirectory)));
    let resolution = resolver
        .resolve(&AdminIdentity::new("root", "SUPERADMIN"))
        .await;

    assert_eq!(resolution.source, ResolutionSource::Superadmin);
    assert!(resolution.issues.is_empty());
}

#[tokio::test]
async fn test_unknown_role_resolves_to_dashboard() {
    let directory = StaticDirectory::new().with_role(Role::new("analyst", &["reports"]));
    let resolution = resolver(directory)
        .resolve(&AdminIdentity::new("u1", "intern"))
        .await;

    assert_eq!(keys(&resolution.features), vec!["dashboard"]);
    assert_eq!(resolution.source, ResolutionSource::Default);
}

#[tokio::test]
async fn test_analyst_scenario() {
    let directory = StaticDirectory::new().with_role(Role::new("Analyst", &["reports"]));
    let resolver = resolver(directory);
    let gate = AccessGate::new(Arc::new(resolver));
    let identity = AdminIdentity::new("a1", "analyst");

    let resolution = gate.resolver().resolve(&identity).await;
    assert_eq!(keys(&resolution.features), vec!["reports"]);

    let filtered = filter_menu(&menu(), &resolution.features);
    let visible: Vec<_> = filtered.walk().map(|i| i.path.as_str()).collect();
    assert_eq!(visible, vec!["/admin/reports", "/admin/logout"]);

    assert_eq!(
        gate.check(&identity, "/admin/deposits").await,
        GateState::Denied {
            redirect: "reports".to_string()
        }
    );
}

#[tokio::test]
async fn test_direct_grants_scenario() {
    let identity = AdminIdentity::new("d1", "analyst")
        .with_direct_features(&["deposits"])
        .with_grant("deposits", ActionGrant::view_only());
    let gate = AccessGate::new(Arc::new(resolver(StaticDirectory::new())));

    assert_eq!(gate.check(&identity, "/admin/deposits/pending").await, GateState::Allowed);
    assert!(gate.check_action(&identity, "deposits", Action::View).await);
    assert!(!gate.check_action(&identity, "deposits", Action::Add).await);
    assert!(!gate.check_action(&identity, "deposits", Action::Edit).await);
    assert!(!gate.check_action(&identity, "deposits", Action::Delete).await);
}

#[tokio::test]
async fn test_country_admin_never_holds_superadmin_only_features() {
    let directory = StaticDirectory::new()
        .with_role(Role::new("country", &["kyc", "role-assignment"]))
        .with_country_admin(
            "c1",
            CountryAdminProfile {
                features: vec![
                    "/admin/users".to_string(),
                    "partner-assignment".to_string(),
                ],
                country: Some("KE".to_string()),
            },
        );
    let resolver = resolver(directory);

    // From the directory profile
    let identity = AdminIdentity::new("c1", "country").country_admin("KE");
    let resolution = resolver.resolve(&identity).await;
    assert_eq!(
        resolution.source,
        ResolutionSource::CountryAdmin {
            origin: ProfileOrigin::Directory
        }
    );
    assert_eq!(keys(&resolution.features), vec!["users"]);

    // From the role, when no profile exists
    let identity = AdminIdentity::new("c2", "country").country_admin("UG");
    let resolution = resolver.resolve(&identity).await;
    assert_eq!(keys(&resolution.features), vec!["kyc"]);
    assert!(!resolution.is_allowed("/admin/role-assignment"));
}

#[tokio::test]
async fn test_country_admin_catalog_hides_superadmin_only() {
    let resolver = resolver(StaticDirectory::new());
    let caller = AdminIdentity::new("c1", "country").country_admin("KE");

    let offered: Vec<_> = resolver
        .assignable_features(&caller)
        .into_iter()
        .map(|f| f.key.clone())
        .collect();
    assert!(!offered.iter().any(|k| k == "role-assignment" || k == "partner-assignment"));

    let admin = AdminIdentity::new("a1", "admin");
    assert_eq!(
        resolver.assignable_features(&admin).len(),
        resolver.catalog().len()
    );
}

// =============================================================================
// 2. Degradation
// =============================================================================

#[tokio::test]
async fn test_role_directory_outage_denies_custom_roles() {
    let resolver = resolver_with(Directories::from_shared(Arc::new(UnreachableDirectory)));
    let resolution = resolver
        .resolve(&AdminIdentity::new("a1", "analyst"))
        .await;

    assert!(resolution.features.is_empty());
    assert_eq!(resolution.source, ResolutionSource::Denied);
    assert!(matches!(
        resolution.issues[..],
        [ResolveIssue::SourceUnavailable {
            lookup: LookupSource::RoleDirectory,
            ..
        }]
    ));
}

#[tokio::test]
async fn test_role_directory_outage_keeps_builtin_admin_on_default() {
    let resolver = resolver_with(Directories::from_shared(Arc::new(UnreachableDirectory)));
    let resolution = resolver.resolve(&AdminIdentity::new("a1", "Admin")).await;

    assert_eq!(keys(&resolution.features), vec!["dashboard"]);
    assert_eq!(resolution.issues.len(), 1);
}

#[tokio::test]
async fn test_country_admin_outage_degrades_to_role() {
    let directories = Directories {
        roles: Arc::new(StaticDirectory::new().with_role(Role::new("country", &["kyc"]))),
        admins: Arc::new(UnreachableDirectory),
        country_admins: Arc::new(UnreachableDirectory),
    };
    let resolver = resolver_with(directories);
    let identity = AdminIdentity::new("c1", "country").country_admin("KE");

    let resolution = resolver.resolve(&identity).await;

    assert_eq!(
        resolution.source,
        ResolutionSource::CustomRole {
            name: "country".to_string()
        }
    );
    assert_eq!(keys(&resolution.features), vec!["kyc"]);
    assert!(matches!(
        resolution.issues[..],
        [ResolveIssue::SourceUnavailable {
            lookup: LookupSource::CountryAdminDirectory,
            ..
        }]
    ));
}

#[tokio::test]
async fn test_snapshot_wins_even_when_directory_is_down() {
    let resolver = resolver_with(Directories::from_shared(Arc::new(UnreachableDirectory)));
    let identity = AdminIdentity::new("c1", "country").country_admin("KE");

    let resolution = resolver
        .resolve_with_snapshot(&identity, Some(r#"{"features": ["deposits/pending"]}"#))
        .await;

    assert_eq!(keys(&resolution.features), vec!["pending"]);
    assert!(resolution.issues.is_empty());
}

#[tokio::test]
async fn test_resolve_by_id() {
    let directory = StaticDirectory::new()
        .with_role(Role::new("analyst", &["reports"]))
        .with_admin(AdminIdentity::new("a1", "analyst"));
    let resolver = resolver(directory);

    let found = resolver.resolve_by_id("a1").await;
    assert_eq!(keys(&found.features), vec!["reports"]);

    let missing = resolver.resolve_by_id("nobody").await;
    assert!(missing.features.is_empty());
    assert_eq!(missing.source, ResolutionSource::Denied);
}

// =============================================================================
// 3. Gate session
// =============================================================================

#[tokio::test]
async fn test_stale_resolution_is_never_published() {
    let roles = Arc::new(StallFirstCall {
        calls: AtomicUsize::new(0),
        roles: vec![
            Role::new("analyst", &["reports"]),
            Role::new("support", &["kyc"]),
        ],
    });
    let static_dir = Arc::new(StaticDirectory::new());
    let directories = Directories {
        roles,
        admins: static_dir.clone(),
        country_admins: static_dir,
    };
    let gate = Arc::new(AccessGate::new(Arc::new(resolver_with(directories))));
    let session = Arc::new(GateSession::new(gate));
    let mut rx = session.subscribe();

    // First evaluation stalls in the role lookup
    let first = {
        let session = session.clone();
        tokio::spawn(async move {
            session
                .evaluate(&AdminIdentity::new("a1", "analyst"), "/admin/reports")
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Identity changes before the first lookup returns
    let second = session
        .evaluate(&AdminIdentity::new("s1", "support"), "/admin/reports")
        .await;

    assert_eq!(
        second,
        Some(GateState::Denied {
            redirect: "kyc".to_string()
        })
    );
    assert_eq!(first.await.unwrap(), None);

    // Nothing newer than the second result was published
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(
        *rx.borrow_and_update(),
        GateState::Denied {
            redirect: "kyc".to_string()
        }
    );
}

#[tokio::test]
async fn test_session_cancel_stops_evaluation() {
    let roles = Arc::new(StallFirstCall {
        calls: AtomicUsize::new(0),
        roles: vec![Role::new("analyst", &["reports"])],
    });
    let static_dir = Arc::new(StaticDirectory::new());
    let directories = Directories {
        roles,
        admins: static_dir.clone(),
        country_admins: static_dir,
    };
    let gate = Arc::new(AccessGate::new(Arc::new(resolver_with(directories))));
    let session = Arc::new(GateSession::new(gate));

    let pending = {
        let session = session.clone();
        tokio::spawn(async move {
            session
                .evaluate(&AdminIdentity::new("a1", "analyst"), "/admin/reports")
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.cancel();

    assert_eq!(pending.await.unwrap(), None);
    assert_eq!(session.state(), GateState::Loading);
}
