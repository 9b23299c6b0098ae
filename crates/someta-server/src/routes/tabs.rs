//! Tab lifecycle and widget routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use someta_core::Error;
use someta_host::Activation;
use someta_settings::WidgetPosition;
use someta_widget::{Message, WidgetController, WidgetPhase, WidgetSnapshot};

use super::{error_response, ApiResult};
use crate::state::AppState;

// ---------------------------------------------------------------
// Route builder
// ---------------------------------------------------------------

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        // Browser events
        .route("/tabs/{tab}", delete(close_tab))
        .route("/tabs/{tab}/activate", post(activate))
        .route("/tabs/{tab}/loaded", post(loaded))
        // Widget
        .route("/tabs/{tab}/widget", get(get_widget))
        .route("/tabs/{tab}/widget/messages", post(send_message))
        .route("/tabs/{tab}/widget/screenshot", post(take_screenshot))
        .route("/tabs/{tab}/widget/minimize", post(minimize))
        .route("/tabs/{tab}/widget/restore", post(restore))
        .route("/tabs/{tab}/widget/toggle", post(toggle))
        .route("/tabs/{tab}/widget/close", post(close_widget))
        .route("/tabs/{tab}/widget/position", put(move_widget))
}

// ---------------------------------------------------------------
// Body types
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SendBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct ActivationResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    activation: Option<Activation>,
}

#[derive(Debug, Serialize)]
struct PhaseResponse {
    phase: WidgetPhase,
}

#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
}

fn page(state: &AppState, tab: &str) -> Result<Arc<WidgetController>, Error> {
    state.pages.get(tab).ok_or(Error::NotActive)
}

// ---------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------

/// POST /api/tabs/{tab}/activate: the browser action was clicked.
async fn activate(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
) -> ApiResult<ActivationResponse> {
    let activation = state.host.activate_tab(&tab).await.map_err(error_response)?;
    Ok(Json(ActivationResponse {
        success: true,
        activation: Some(activation),
    }))
}

/// POST /api/tabs/{tab}/loaded: activates only with `autoActivate` on.
async fn loaded(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
) -> ApiResult<ActivationResponse> {
    let activation = state.host.tab_loaded(&tab).await.map_err(error_response)?;
    Ok(Json(ActivationResponse {
        success: true,
        activation,
    }))
}

/// DELETE /api/tabs/{tab}
async fn close_tab(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
) -> Json<SuccessResponse> {
    Json(SuccessResponse {
        success: state.forget_tab(&tab),
    })
}

/// GET /api/tabs/{tab}/widget
async fn get_widget(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
) -> Json<WidgetSnapshot> {
    let snapshot = match state.pages.get(&tab) {
        Some(controller) => controller.snapshot(),
        None => WidgetSnapshot::absent(WidgetPhase::Hidden),
    };
    Json(snapshot)
}

/// POST /api/tabs/{tab}/widget/messages: returns the reply appended to
/// the log, which is an error message when the backend failed.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
    Json(body): Json<SendBody>,
) -> ApiResult<Message> {
    let controller = page(&state, &tab).map_err(error_response)?;
    let reply = controller
        .send_message(&body.message)
        .await
        .map_err(error_response)?;
    Ok(Json(reply))
}

/// POST /api/tabs/{tab}/widget/screenshot
async fn take_screenshot(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
) -> ApiResult<Message> {
    let controller = page(&state, &tab).map_err(error_response)?;
    let reply = controller.take_screenshot().await.map_err(error_response)?;
    Ok(Json(reply))
}

async fn minimize(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
) -> ApiResult<PhaseResponse> {
    transition(&state, &tab, WidgetController::minimize)
}

async fn restore(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
) -> ApiResult<PhaseResponse> {
    transition(&state, &tab, WidgetController::restore)
}

async fn toggle(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
) -> ApiResult<PhaseResponse> {
    transition(&state, &tab, WidgetController::toggle_minimized)
}

fn transition(
    state: &AppState,
    tab: &str,
    f: impl FnOnce(&WidgetController) -> someta_core::Result<WidgetPhase>,
) -> ApiResult<PhaseResponse> {
    let controller = page(state, tab).map_err(error_response)?;
    let phase = f(&*controller).map_err(error_response)?;
    Ok(Json(PhaseResponse { phase }))
}

/// POST /api/tabs/{tab}/widget/close: the page context stays, so the next
/// activation opens a fresh widget without re-injecting.
async fn close_widget(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
) -> ApiResult<SuccessResponse> {
    let controller = page(&state, &tab).map_err(error_response)?;
    Ok(Json(SuccessResponse {
        success: controller.close(),
    }))
}

/// PUT /api/tabs/{tab}/widget/position: drag ended.
async fn move_widget(
    State(state): State<Arc<AppState>>,
    Path(tab): Path<String>,
    Json(position): Json<WidgetPosition>,
) -> ApiResult<SuccessResponse> {
    let controller = page(&state, &tab).map_err(error_response)?;
    controller.move_to(position).map_err(error_response)?;
    Ok(Json(SuccessResponse { success: true }))
}
