//! Router construction and server lifecycle.

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::ApiState;
use super::{handlers, response};

/// Build the router with all routes.
pub fn build_router(state: ApiState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Dependency routes
        .route(
            "/api/task-dependencies",
            post(handlers::create_dependency),
        )
        .route(
            "/api/task-dependencies/task/{task_id}",
            get(handlers::get_task_dependencies).delete(handlers::delete_task_dependencies),
        )
        .route(
            "/api/task-dependencies/project/{project_id}",
            get(handlers::get_project_dependencies),
        )
        .route(
            "/api/task-dependencies/{id}",
            get(handlers::get_dependency)
                .put(handlers::update_dependency)
                .delete(handlers::delete_dependency),
        )
        // Task routes
        .route("/api/tasks/gantt/data", get(handlers::gantt_data))
        .route("/api/tasks/{task_id}", delete(handlers::delete_task))
        .route("/api/health", get(handlers::health))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::map_response(response::envelope_timeouts))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle for a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            error!("API server task failed: {}", e);
        }
    }
}

/// Bind `addr` and serve the API in a background task.
///
/// Port 0 picks a free port; read it back with [`ServerHandle::addr`].
pub async fn start_server(
    state: ApiState,
    addr: &str,
    request_timeout: Duration,
) -> anyhow::Result<ServerHandle> {
    let app = build_router(state, request_timeout);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            error!("API server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: bound_addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
