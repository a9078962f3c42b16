use crate::server::ServerState;
use axum_extra::extract::cookie::Key;
use federkiel_db::client::{DbClient, DbConfig, DbError};
use serde::Deserialize;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

/// `Key::derive_from` needs at least this much entropy to work with.
const SESSION_SECRET_MIN_LEN: usize = 32;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("SESSION_SECRET must be at least {SESSION_SECRET_MIN_LEN} bytes")]
    WeakSessionSecret,
    #[error("Error reaching the database: {0}")]
    Database(#[from] DbError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    pg_host: String,
    pg_port: u16,
    pg_database: String,
    pg_user: String,
    pg_password: String,
    session_secret: String,
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "federkiel_web=debug,federkiel_db=debug,\
                federkiel_common=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

/// Expired sessions are already rejected at the extractor; this keeps the
/// table from growing without bound.
async fn sweep_expired_sessions(db_client: Arc<DbClient>) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);

    loop {
        interval.tick().await;

        match db_client.delete_expired_sessions().await {
            Ok(0) => {}
            Ok(swept) => debug!(swept, "Swept expired sessions"),
            Err(e) => error!(error = %e, "Sweeping expired sessions failed"),
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Listening for shutdown signal failed"),
    }
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    if env.session_secret.len() < SESSION_SECRET_MIN_LEN {
        return Err(InitError::WeakSessionSecret);
    }

    let db_config = DbConfig {
        host: env.pg_host,
        port: env.pg_port,
        database: env.pg_database,
        user: env.pg_user,
        password: env.pg_password,
    };

    // A database that cannot be reached at startup is fatal.
    let db_client = Arc::new(DbClient::connect(&db_config).await?);
    db_client.ensure_schema().await?;

    tokio::spawn(sweep_expired_sessions(Arc::clone(&db_client)));

    let state = ServerState {
        db_client: Arc::clone(&db_client),
        cookie_key: Key::derive_from(env.session_secret.as_bytes()),
    };

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes().layer(tracing_layer).with_state(state);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;

    info!(%server_address, "Serving");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    db_client.close().await;

    Ok(())
}
