//! HTTP server.
//!
//! Assembles the axum router over the services and runs it until Ctrl-C or
//! SIGTERM, then drains in-flight requests for a bounded grace period.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;

use crate::commands;
use crate::db::Store;
use crate::error::AppError;
use crate::services::{
    PullRequestService, ReviewerPicker, StatsService, TeamService, UserService,
};

/// Shared state for the axum routes.
#[derive(Clone)]
pub struct AppState {
    pub teams: TeamService,
    pub users: UserService,
    pub pull_requests: PullRequestService,
    pub stats: StatsService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, picker: Arc<dyn ReviewerPicker>) -> Self {
        Self {
            teams: TeamService::new(store.clone()),
            users: UserService::new(store.clone(), picker.clone()),
            pull_requests: PullRequestService::new(store.clone(), picker),
            stats: StatsService::new(store),
        }
    }
}

/// Build the full router with every resource's routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(commands::teams::routes())
        .merge(commands::users::routes())
        .merge(commands::pull_requests::routes())
        .merge(commands::stats::routes())
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Bind `0.0.0.0:port` and serve until a shutdown signal arrives.
///
/// After the signal, in-flight requests get `grace` to finish. Connection
/// tasks still running afterwards are left to the runtime: they are dropped
/// when it shuts down, and their open transactions roll back with them.
pub async fn serve(state: AppState, port: u16, grace: Duration) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to port {}: {}", port, e)))?;

    log::info!("[server] Listening on http://{}", addr);

    let (signalled_tx, signalled_rx) = oneshot::channel();
    let app = router(state);

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(());
            })
            .await
    });

    tokio::select! {
        joined = &mut server => return finish(joined),
        _ = signalled_rx => {
            log::info!("[server] Shutdown requested, draining for up to {:?}", grace);
        }
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => finish(joined),
        Err(_) => {
            log::warn!("[server] Grace period elapsed, abandoning remaining requests");
            server.abort();
            Ok(())
        }
    }
}

fn finish(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(Ok(())) => {
            log::info!("[server] Stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(AppError::internal(format!("Server error: {}", e))),
        Err(e) => Err(AppError::internal(format!("Server task failed: {}", e))),
    }
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("[server] Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("[server] Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
