//! Settings editor routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use someta_settings::{SettingsResponse, SettingsUpdate};

use super::{error_response, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

/// GET /api/settings: stored values with the key masked.
async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    Json(state.settings.get().to_response())
}

/// PUT /api/settings: merge the given keys into the stored settings.
async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<SettingsResponse> {
    let settings = state.settings.update(&update).map_err(error_response)?;
    Ok(Json(settings.to_response()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support;

    #[tokio::test]
    async fn test_update_merges_and_masks_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_support::state(&dir, "http://127.0.0.1:9");

        let update: SettingsUpdate =
            serde_json::from_value(serde_json::json!({"apiKey": "secret", "darkMode": true}))
                .unwrap();
        let Json(response) = update_settings(State(state.clone()), Json(update))
            .await
            .unwrap();
        assert!(response.api_key_configured);
        assert!(response.dark_mode);

        let update: SettingsUpdate =
            serde_json::from_value(serde_json::json!({"autoActivate": true})).unwrap();
        update_settings(State(state.clone()), Json(update))
            .await
            .unwrap();

        let Json(response) = get_settings(State(state.clone())).await;
        assert!(response.dark_mode);
        assert!(response.auto_activate);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("apiKey").is_none());

        // persisted for the next start
        let raw = std::fs::read_to_string(&state.config.data_paths.settings_file).unwrap();
        assert!(raw.contains("secret"));
    }
}
