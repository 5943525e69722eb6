//! API routes and handlers

use crate::access_control::{
    Action, AdminIdentity, AllowedFeatureSet, GateState, GrantTable, Resolution, ResolutionSource,
};
use crate::catalog::{Feature, MenuTree, filter_menu};
use crate::error::ResolveIssue;
use crate::server::AppState;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/catalog", get(catalog))
        .route("/api/resolve", post(resolve))
        .route("/api/resolve/{id}", post(resolve_by_id))
        .route("/api/check", post(check))
        .route("/api/menu", post(menu))
        .with_state(state)
}

/// Identity plus the client's cached admin record, if any
#[derive(Debug, Deserialize)]
pub struct IdentityRequest {
    pub identity: AdminIdentity,

    /// Cached record as a JSON string or an inline object
    #[serde(default)]
    pub cached_snapshot: Option<Value>,
}

impl IdentityRequest {
    fn snapshot(&self) -> Option<String> {
        match self.cached_snapshot.as_ref()? {
            Value::Null => None,
            Value::String(raw) => Some(raw.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(flatten)]
    pub request: IdentityRequest,
    pub path: String,
    #[serde(default)]
    pub action: Option<Action>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub country_admin: bool,
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub features: AllowedFeatureSet,
    pub grants: GrantTable,
    pub source: ResolutionSource,
    pub issues: Vec<ResolveIssue>,
    pub landing: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    #[serde(flatten)]
    pub state: GateState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_allowed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub menu: MenuTree,
    pub landing: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        features: state.catalog_features(query.country_admin, query.q.as_deref()),
    })
}

impl ResolveResponse {
    pub fn new(state: &AppState, resolution: Resolution) -> Self {
        let landing = state.gate.landing(&resolution.features);
        Self {
            features: resolution.features,
            grants: resolution.grants,
            source: resolution.source,
            issues: resolution.issues,
            landing,
        }
    }
}

impl CheckResponse {
    /// Gate decision for `path`, plus the action permission when asked
    pub fn new(state: &AppState, resolution: &Resolution, path: &str, action: Option<Action>) -> Self {
        let gate_state = state.gate.decide(resolution, path);
        let action_allowed =
            action.map(|action| gate_state.is_allowed() && resolution.can(path, action));
        Self {
            state: gate_state,
            action_allowed,
        }
    }
}

async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<IdentityRequest>,
) -> Json<ResolveResponse> {
    let snapshot = request.snapshot();
    let resolution = state
        .resolver()
        .resolve_with_snapshot(&request.identity, snapshot.as_deref())
        .await;
    Json(ResolveResponse::new(&state, resolution))
}

async fn resolve_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ResolveResponse> {
    let resolution = state.resolver().resolve_by_id(&id).await;
    Json(ResolveResponse::new(&state, resolution))
}

async fn check(
    State(state): State<AppState>,
    Json(check): Json<CheckRequest>,
) -> Json<CheckResponse> {
    let snapshot = check.request.snapshot();
    let resolution = state
        .resolver()
        .resolve_with_snapshot(&check.request.identity, snapshot.as_deref())
        .await;

    Json(CheckResponse::new(
        &state,
        &resolution,
        &check.path,
        check.action,
    ))
}

async fn menu(
    State(state): State<AppState>,
    Json(request): Json<IdentityRequest>,
) -> Json<MenuResponse> {
    let snapshot = request.snapshot();
    let resolution = state
        .resolver()
        .resolve_with_snapshot(&request.identity, snapshot.as_deref())
        .await;

    Json(MenuResponse {
        menu: filter_menu(&state.menu, &resolution.features),
        landing: state.gate.landing(&resolution.features),
    })
}
