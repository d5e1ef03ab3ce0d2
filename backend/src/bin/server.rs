//! Plan engine HTTP server binary.
//!
//! # Usage
//!
//! ```bash
//! GRAPHQL_PROXY_URL=https://proxy.example.org/forward \
//! GRAPHQL_API_URL=https://metrics.example.org/graphql \
//!   cargo run --bin plan-engine-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `PLAN_ENGINE_CONFIG`: Path to the TOML config (default: search `plan_engine.toml`)
//! - `GRAPHQL_PROXY_URL`, `GRAPHQL_API_URL`, `PLAN_ENGINE_MAX_CONCURRENCY`,
//!   `PLAN_ENGINE_FAULT_POLICY`: override the matching config settings
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use plan_engine::config::EngineConfig;
use plan_engine::graphql::HttpProxyClient;
use plan_engine::http::{create_router, AppState};
use plan_engine::metadata::{MetadataProvider, MetricCatalog, NoMetadata};
use plan_engine::services::PlanExecutor;

fn load_config() -> anyhow::Result<EngineConfig> {
    let config = match env::var("PLAN_ENGINE_CONFIG") {
        Ok(path) => EngineConfig::from_file(&path)?,
        Err(_) => EngineConfig::from_default_location().unwrap_or_else(|e| {
            warn!("{}; using built-in defaults", e);
            EngineConfig::default()
        }),
    };
    let config = config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn load_metadata(config: &EngineConfig) -> Arc<dyn MetadataProvider> {
    match MetricCatalog::from_file(&config.metadata.catalog_path) {
        Ok(catalog) => {
            catalog.completeness_warnings();
            Arc::new(catalog)
        }
        Err(e) => {
            warn!("{}; display names fall back to metric codes", e);
            Arc::new(NoMetadata)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting plan engine HTTP server");

    let config = load_config()?;
    let client = HttpProxyClient::from_config(&config.backend)?;
    let metadata = load_metadata(&config);
    let executor = PlanExecutor::new(Arc::new(client), metadata)
        .with_options(config.execution_options());
    info!(
        max_concurrency = config.engine.max_concurrency,
        fault_policy = %config.engine.fault_policy,
        "Plan executor ready"
    );

    let state = AppState::new(Arc::new(executor), config.engine.max_concurrency);
    let app = create_router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
