//! HTTP API
//!
//! Exposes resolution, gate checks, menu filtering and the feature catalog
//! over JSON so a dashboard frontend can ask one place for every access
//! decision.

pub mod api;

pub use api::router;

use crate::access_control::{AccessGate, AccessPolicy, PermissionResolver};
use crate::catalog::{Feature, FeatureCatalog, MenuTree};
use crate::config::{AppConfig, ServerConfig, load_menu};
use crate::directory::Directories;
use crate::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub menu: Arc<MenuTree>,
}

impl AppState {
    pub fn new(gate: Arc<AccessGate>, menu: Arc<MenuTree>) -> Self {
        Self { gate, menu }
    }

    /// Wire menu, catalog, policy and directories from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let menu = load_menu(config)?;
        let catalog = FeatureCatalog::from_menu(&menu);
        if catalog.is_empty() {
            tracing::warn!("Feature catalog is empty; only default features will resolve");
        }

        let directories = Directories::from_config(&config.directory)?;
        let resolver = PermissionResolver::new(
            Arc::new(catalog),
            AccessPolicy::new(&config.access),
            directories,
        );

        Ok(Self::new(
            Arc::new(AccessGate::new(Arc::new(resolver))),
            Arc::new(menu),
        ))
    }

    pub fn resolver(&self) -> &PermissionResolver {
        self.gate.resolver()
    }

    /// Catalog features as offered to a caller, optionally narrowed by a
    /// route or name query
    pub fn catalog_features(&self, country_admin: bool, query: Option<&str>) -> Vec<Feature> {
        let resolver = self.resolver();
        let catalog = resolver.catalog();

        let mut features = catalog.assignable(country_admin, resolver.policy().superadmin_only());
        if let Some(query) = query {
            let matches = catalog.search(query);
            features.retain(|f| matches.iter().any(|m| m.key == f.key));
        }

        features.into_iter().cloned().collect()
    }
}

/// Run the API server until Ctrl+C
pub async fn run_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let bind: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let app = router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(bind).await?;
    info!("Feature gate API listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
