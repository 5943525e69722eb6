//! Feature Gate
//!
//! Resolves admin identities to the dashboard features they may reach.

use clap::{Parser, Subcommand};
use feature_gate::{
    access_control::{Action, AdminIdentity},
    catalog::filter_menu,
    config::{LogFormat, load_config},
    server::{
        AppState,
        api::{CheckResponse, ResolveResponse},
        run_server,
    },
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Feature Gate - feature-based access control for the admin dashboard
#[derive(Parser, Debug)]
#[command(name = "feature-gate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "FEATURE_GATE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FEATURE_GATE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Override server.host
        #[arg(long)]
        host: Option<String>,

        /// Override server.port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Resolve an identity and print its features, grants and landing page
    Resolve {
        /// Identity JSON file
        #[arg(required_unless_present = "id")]
        identity: Option<PathBuf>,

        /// Fetch the identity from the admin directory instead
        #[arg(long, conflicts_with = "identity")]
        id: Option<String>,

        /// Cached admin record JSON file
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Check whether an identity may open a feature path
    Check {
        /// Identity JSON file
        identity: PathBuf,

        /// Feature path, e.g. /admin/deposits/pending
        path: String,

        /// Also check an action (view, add, edit, delete)
        #[arg(long, value_parser = parse_action)]
        action: Option<Action>,
    },

    /// Print the menu filtered for an identity
    Menu {
        /// Identity JSON file
        identity: PathBuf,
    },

    /// Print the feature catalog
    Catalog {
        /// Hide superadmin-only features, as offered to country admins
        #[arg(long)]
        country_admin: bool,

        /// Only features matching this route or name
        #[arg(long)]
        search: Option<String>,
    },
}

fn parse_action(s: &str) -> Result<Action, String> {
    Action::try_parse(s).ok_or_else(|| format!("unknown action '{}'", s))
}

fn read_identity(path: &Path) -> anyhow::Result<AdminIdentity> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up DIRECTORY_URL / DIRECTORY_TOKEN from a local .env
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = load_config(args.config.as_deref());

    // Initialize logging before reporting configuration errors
    let (level, format) = match &config {
        Ok(config) => (config.logging.level.clone(), config.logging.format),
        Err(_) => ("info".to_string(), LogFormat::Pretty),
    };
    let level = args.log_level.clone().unwrap_or(level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    let mut config =
        config.inspect_err(|e| error!(error = %e, "Failed to load configuration"))?;

    let state = AppState::from_config(&config)
        .inspect_err(|e| error!(error = %e, "Failed to initialize access control"))?;

    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            info!(
                version = env!("CARGO_PKG_VERSION"),
                features = state.resolver().catalog().len(),
                "Starting feature gate"
            );
            run_server(&config.server, state).await?;
        }
        Command::Resolve {
            identity,
            id,
            snapshot,
        } => {
            let resolution = match (identity, id) {
                (_, Some(id)) => state.resolver().resolve_by_id(&id).await,
                (Some(path), None) => {
                    let identity = read_identity(&path)?;
                    let snapshot = snapshot.map(std::fs::read_to_string).transpose()?;
                    state
                        .resolver()
                        .resolve_with_snapshot(&identity, snapshot.as_deref())
                        .await
                }
                (None, None) => anyhow::bail!("an identity file or --id is required"),
            };

            print_json(&ResolveResponse::new(&state, resolution))?;
        }
        Command::Check {
            identity,
            path,
            action,
        } => {
            let identity = read_identity(&identity)?;
            let resolution = state.resolver().resolve(&identity).await;
            print_json(&CheckResponse::new(&state, &resolution, &path, action))?;
        }
        Command::Menu { identity } => {
            let identity = read_identity(&identity)?;
            let resolution = state.resolver().resolve(&identity).await;
            print_json(&filter_menu(&state.menu, &resolution.features))?;
        }
        Command::Catalog {
            country_admin,
            search,
        } => {
            print_json(&state.catalog_features(country_admin, search.as_deref()))?;
        }
    }

    Ok(())
}
