//! HTTP server for the Directory Service.
//!
//! Thin axum layer over the pure selector: each handler validates the
//! `client_id` query parameter, runs the selection (or reports the
//! process identity), and serializes a small JSON body.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use pinroute_selector::{select_route, RoutingConfig};

use crate::error::{DirectoryError, Result};

/// Body of a successful `GET /where`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereResponse {
    pub client_id: String,
    /// The deterministically selected target, `host:port`.
    pub hostport: String,
}

/// Body of a successful `GET /join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub status: String,
    pub client_id: String,
    /// This process's own identity, `host:port`.
    pub assigned: String,
}

#[derive(Debug, Deserialize)]
struct ClientIdQuery {
    client_id: Option<String>,
}

impl ClientIdQuery {
    /// A missing and an empty `client_id` are the same client error.
    fn require(self) -> std::result::Result<String, Response> {
        match self.client_id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err((StatusCode::BAD_REQUEST, "missing client_id").into_response()),
        }
    }
}

/// HTTP server for one Directory Service replica.
pub struct HttpServer {
    config: Arc<RoutingConfig>,
}

impl HttpServer {
    pub fn new(config: Arc<RoutingConfig>) -> Self {
        Self { config }
    }

    /// Builds the axum router with all three operations.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/where", get(handle_where))
            .route("/join", get(handle_join))
            .route("/health", get(handle_health))
            .layer(CorsLayer::permissive())
            .with_state(self.config.clone())
    }

    /// Binds `addr` and serves until shutdown.
    ///
    /// Bind failure is the only fatal error in the service.
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DirectoryError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        self.serve_on(listener).await
    }

    /// Serves on an already-bound listener. Split out of [`run`] so
    /// tests can bind an ephemeral port first.
    ///
    /// [`run`]: HttpServer::run
    pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| DirectoryError::Transport(format!("Failed to get local addr: {}", e)))?;
        info!(
            "directory service listening on {} (identity {})",
            local_addr,
            self.config.identity.host_port()
        );

        let app = self.router();
        axum::serve(listener, app)
            .await
            .map_err(|e| DirectoryError::Transport(format!("Server error: {}", e)))?;

        Ok(())
    }
}

async fn handle_where(
    State(config): State<Arc<RoutingConfig>>,
    Query(query): Query<ClientIdQuery>,
) -> Response {
    let client_id = match query.require() {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let hostport = select_route(&client_id, &config);
    info!("/where client_id={} assigned to {}", client_id, hostport);

    Json(WhereResponse { client_id, hostport }).into_response()
}

async fn handle_join(
    State(config): State<Arc<RoutingConfig>>,
    Query(query): Query<ClientIdQuery>,
) -> Response {
    let client_id = match query.require() {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let assigned = config.identity.host_port();
    info!("/join client_id={} registered to {}", client_id, assigned);

    Json(JoinResponse {
        status: "ok".to_string(),
        client_id,
        assigned,
    })
    .into_response()
}

async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
