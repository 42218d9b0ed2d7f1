use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};

use config::AppConfig;
use database::AppDatabase;
use dotenvy::dotenv;
use jobs::{notification::FcmGateway, spawn_all_jobs};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod app;
pub mod config;
pub mod constants;
pub mod database;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod store;
pub mod utils;

pub async fn start_web_server() -> anyhow::Result<()> {
    // import .env file
    dotenv().ok();
    initialize_logging();
    let config = AppConfig::from_env()?;
    // create database client
    let db_client = AppDatabase::new(&config.mongo)
        .await
        .context("Unable to acquire database client")?;
    let db_client = Arc::new(db_client);
    let gateway = FcmGateway::new(
        config.service_account.clone(),
        config.dispatch.call_timeout,
    )?;
    let shutdown = CancellationToken::new();
    let handles = spawn_all_jobs(&config, db_client, Arc::new(gateway), shutdown.clone());
    let served = start_server(config.port).await;
    tracing::info!("stopping background jobs");
    shutdown.cancel();
    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!("background job ended abnormally: {err}");
        }
    }
    served
}

fn initialize_logging() {
    // create default env filter
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or("smartdiet_push_relay=debug".into());

    // initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

async fn start_server(port: u16) -> anyhow::Result<()> {
    // build the socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    // create the app instance
    let app = app::build_app();
    tracing::debug!("Starting the app in: {addr}");
    // start serving the app in the socket address
    axum::Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("unable to listen for ctrl-c: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("unable to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
