//! Raw relay endpoint for page scripts.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use someta_relay::{RelayRequest, RelayResponse};
use tracing::debug;

use super::{error_response, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/relay/{tab}", post(relay))
}

/// POST /api/relay/{tab}: deliver one message to the host context, tagged
/// with the sending tab, and return its reply.
async fn relay(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
    Json(request): Json<RelayRequest>,
) -> ApiResult<RelayResponse> {
    debug!("Relay {} from tab {}", request.action, tab);
    let response = state
        .host_relay
        .with_origin(tab)
        .send(request)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(response))
}
