//! Gatehouse demo server binary.
//!
//! Serves a handful of open and role-guarded routes through an
//! `AuthDispatcher`, with sessions carried in the `session` cookie.

mod cli;
mod routes;

use std::sync::Arc;

use clap::Parser;
use gatehouse_api::config::ApiConfig;
use gatehouse_core::SessionStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gatehouse_api=debug,gatehouse_core=debug")),
        )
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env()?;
    args.apply(&mut config);

    info!(
        session_timeout_secs = config.session.session_timeout_secs(),
        control_interval_secs = config.session.control_interval.num_seconds(),
        background_sweep = args.background_sweep,
        users = args.users.len(),
        "starting gatehouse_server"
    );

    let store = Arc::new(SessionStore::new(config.session));
    let sweeper = args.background_sweep.then(|| store.spawn_sweeper());

    let directory = args
        .users
        .iter()
        .map(|user| (user.username.clone(), user.clone()))
        .collect();
    let app = routes::dispatcher(store, directory).build()?.into_router();

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    Ok(())
}
