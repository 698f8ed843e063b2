use anyhow::Error as AnyhowError;
use deployment::Deployment;
use server::{DeploymentImpl, routes};
use services::services::config::Config;
use tracing_subscriber::{EnvFilter, prelude::*};
use utils::sentry::{init_once, sentry_layer};

const WORKSPACE_CRATES: &[&str] = &[
    "server",
    "services",
    "db",
    "deployment",
    "local_deployment",
    "utils",
];

#[tokio::main]
async fn main() -> Result<(), AnyhowError> {
    let dotenv_path = dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let _sentry = init_once(config.sentry_dsn.as_deref());

    let filter_string = WORKSPACE_CRATES.iter().fold("warn".to_string(), |acc, krate| {
        format!("{acc},{krate}={}", config.log_level)
    });
    let env_filter = EnvFilter::try_new(filter_string)?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .with(sentry_layer())
        .init();

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let address = format!("{}:{}", config.host, config.port);
    let deployment = DeploymentImpl::from_config(config).await?;
    deployment.prepare().await?;

    let app = routes::router(deployment);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
