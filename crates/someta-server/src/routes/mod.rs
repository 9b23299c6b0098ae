//! HTTP route handlers for the local API.

pub mod health;
pub mod relay;
pub mod settings;
pub mod tabs;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Json, Router};
use someta_core::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::routes())
        .merge(settings::routes())
        .merge(relay::routes())
        .merge(tabs::routes())
}

/// JSON body on success, `{ "error": ... }` with a status otherwise.
pub(crate) type ApiResult<T> = Result<Json<T>, (StatusCode, Json<serde_json::Value>)>;

/// Map a core error to a status and `{ "error": ... }` body.
pub(crate) fn error_response(err: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        Error::NotActive => StatusCode::NOT_FOUND,
        Error::Busy => StatusCode::CONFLICT,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::Relay(_) | Error::Http(_) | Error::Backend(_) | Error::Capture(_) => {
            StatusCode::BAD_GATEWAY
        }
        Error::Io(_) | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Request failed: {}", err);
    }
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(error_response(Error::NotActive).0, StatusCode::NOT_FOUND);
        assert_eq!(error_response(Error::Busy).0, StatusCode::CONFLICT);
        let (status, Json(body)) = error_response(Error::Relay("Receiving end does not exist".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Relay error: Receiving end does not exist");
    }

    #[test]
    fn test_local_failures_are_server_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert_eq!(
            error_response(Error::Io(io)).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            error_response(Error::Json(json)).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            error_response(Error::InvalidInput("empty".into())).0,
            StatusCode::BAD_REQUEST
        );
    }
}
