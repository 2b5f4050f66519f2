//! Web dendrite: receives excitation fired by other neurones over HTTP and
//! pushes it onto the axon's queue. Also serves the latest neurone snapshot.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use neurone_core::NeuroneSnapshot;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct DendriteState {
    pub excitation: mpsc::Sender<f32>,
    pub status: watch::Receiver<NeuroneSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct ExcitationQuery {
    pub e: f32,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub async fn excite(
    State(state): State<DendriteState>,
    Query(query): Query<ExcitationQuery>,
) -> StatusCode {
    if !query.e.is_finite() {
        warn!(delta_energy = query.e, "Rejected non-finite excitation");
        return StatusCode::BAD_REQUEST;
    }
    debug!(delta_energy = query.e, "Excitation received");
    match state.excitation.send(query.e).await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn status(State(state): State<DendriteState>) -> Json<NeuroneSnapshot> {
    Json(*state.status.borrow())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn router(state: DendriteState) -> Router {
    Router::new()
        .route("/", get(excite))
        .route("/status", get(status))
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve the dendrite on `address` in the background. A bind failure is logged
/// and the neurone carries on without network input.
pub fn spawn_dendrite(address: String, state: DendriteState) {
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(&address).await {
            Ok(l) => l,
            Err(e) => {
                error!(address = %address, error = %e, "Failed to bind web dendrite");
                return;
            }
        };
        info!(address = %address, "Web dendrite listening");

        if let Err(e) = axum::serve(listener, router(state)).await {
            error!(error = %e, "Web dendrite exited with error");
        }
    });
}
