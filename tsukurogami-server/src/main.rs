use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tsukurogami_client::{AuthenticatedTransport, BitbucketClient, XcodeClient};
use tsukurogami_core::instance::InstanceSettings;

use crate::config::{Cli, Config};
use crate::service::{IntegrationRelay, LogBuffer, Reconciler};

pub mod api;
pub mod config;
pub mod service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = match Config::load(cli).and_then(|config| config.validate()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}\n", e);
            let _ = Cli::command().print_help();
            std::process::exit(2);
        }
    };

    // Initialize tracing; a second, uncoloured copy of every event feeds GET /logs
    let logs = LogBuffer::new(settings.log_capacity);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tsukurogami_server=info,tower_http=debug".into()),
        )
        .with(fmt::layer())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(logs.spawn_writer()),
        )
        .init();

    tracing::info!("Starting Tsukurogami...");

    let xcode = XcodeClient::new(
        settings.xcode_base(),
        AuthenticatedTransport::new(settings.xcode_credentials.clone(), settings.skip_verify)
            .context("Failed to build CI server client")?,
    );
    let bitbucket = BitbucketClient::new(
        &settings.bitbucket_base(),
        AuthenticatedTransport::new(
            settings.bitbucket_credentials.clone(),
            settings.skip_verify,
        )
        .context("Failed to build source-control client")?,
    )
    .context("Invalid source-control URL")?;

    let host = config::discover_callback_host(&settings.xcode_url).await;
    let callback_url = settings.callback_url(&host);
    tracing::info!("Builds will report back to {}", callback_url);

    let instance_settings = InstanceSettings::new(callback_url)
        .with_trunk_branch(settings.trunk_branch.clone())
        .with_name_pattern(settings.name_pattern.clone());

    let state = api::AppState {
        reconciler: Arc::new(Reconciler::new(Arc::new(xcode), instance_settings)),
        relay: Arc::new(IntegrationRelay::new(
            Arc::new(bitbucket),
            settings.xcode_base(),
        )),
        logs,
    };

    // Build router with all API endpoints
    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", settings.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
