//! Relay message types: the JSON shapes exchanged between contexts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Action tag carried by every relay request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelayAction {
    SendToBackend,
    TakeScreenshot,
    ActivateWidget,
    /// Any action string no context understands.
    #[serde(other)]
    Unknown,
}

impl RelayAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendToBackend => "sendToBackend",
            Self::TakeScreenshot => "takeScreenshot",
            Self::ActivateWidget => "activateWidget",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RelayAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Body of a `sendToBackend` request, forwarded verbatim to the chat API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendPayload {
    pub message: String,
    #[serde(default)]
    pub screenshot: Option<String>,
}

impl BackendPayload {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            screenshot: None,
        }
    }

    pub fn with_screenshot(message: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            screenshot: Some(data_url.into()),
        }
    }
}

/// An action-tagged request. Everything besides `action` is opaque to the
/// bridge and travels alongside it as sibling keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayRequest {
    pub action: RelayAction,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl RelayRequest {
    pub fn new(action: RelayAction) -> Self {
        Self {
            action,
            payload: Map::new(),
        }
    }

    /// `{action: "sendToBackend", data: {message, screenshot}, headers}`.
    pub fn send_to_backend(data: &BackendPayload, headers: BTreeMap<String, String>) -> Self {
        let mut request = Self::new(RelayAction::SendToBackend);
        request.payload.insert(
            "data".into(),
            serde_json::json!({
                "message": data.message,
                "screenshot": data.screenshot,
            }),
        );
        request.payload.insert(
            "headers".into(),
            Value::Object(
                headers
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ),
        );
        request
    }

    pub fn take_screenshot() -> Self {
        Self::new(RelayAction::TakeScreenshot)
    }

    pub fn activate_widget() -> Self {
        Self::new(RelayAction::ActivateWidget)
    }

    /// Decode the `data` field of a `sendToBackend` request.
    pub fn backend_payload(&self) -> Result<BackendPayload, serde_json::Error> {
        let data = self.payload.get("data").cloned().unwrap_or(Value::Null);
        serde_json::from_value(data)
    }

    /// Headers the caller attached, if any. Non-string values are skipped.
    pub fn headers(&self) -> Option<BTreeMap<String, String>> {
        let headers = self.payload.get("headers")?.as_object()?;
        Some(
            headers
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect(),
        )
    }
}

/// Reply to a relay request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "dataUrl")]
    pub data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayResponse {
    /// `{success: true}`.
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            data_url: None,
            error: None,
        }
    }

    pub fn with_data(data: impl Into<Value>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::ok()
        }
    }

    pub fn with_data_url(data_url: impl Into<String>) -> Self {
        Self {
            data_url: Some(data_url.into()),
            ..Self::ok()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            data_url: None,
            error: Some(error.into()),
        }
    }

    /// `data` as text, when the response carries a string.
    pub fn data_text(&self) -> Option<&str> {
        self.data.as_ref().and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_to_backend_wire_shape() {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer X".to_string());
        let request = RelayRequest::send_to_backend(&BackendPayload::text("hi"), headers);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"], "sendToBackend");
        assert_eq!(json["data"]["message"], "hi");
        assert!(json["data"]["screenshot"].is_null());
        assert_eq!(json["headers"]["Authorization"], "Bearer X");
    }

    #[test]
    fn test_parse_page_script_message() {
        let raw = r#"{"action":"sendToBackend","data":{"message":"m","screenshot":"data:image/png;base64,AA"}}"#;
        let request: RelayRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.action, RelayAction::SendToBackend);
        let payload = request.backend_payload().unwrap();
        assert_eq!(payload.message, "m");
        assert_eq!(payload.screenshot.as_deref(), Some("data:image/png;base64,AA"));
        assert!(request.headers().is_none());
    }

    #[test]
    fn test_unknown_action_parses() {
        let request: RelayRequest =
            serde_json::from_str(r#"{"action":"openSidePanel","tab":3}"#).unwrap();
        assert_eq!(request.action, RelayAction::Unknown);
        assert_eq!(request.payload["tab"], 3);
    }

    #[test]
    fn test_missing_backend_data_is_error() {
        assert!(RelayRequest::take_screenshot().backend_payload().is_err());
    }

    #[test]
    fn test_response_shapes() {
        let ok = serde_json::to_value(RelayResponse::ok()).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true}));

        let shot = serde_json::to_value(RelayResponse::with_data_url("data:x")).unwrap();
        assert_eq!(shot, serde_json::json!({"success": true, "dataUrl": "data:x"}));

        let err = serde_json::to_value(RelayResponse::failure("nope")).unwrap();
        assert_eq!(err, serde_json::json!({"success": false, "error": "nope"}));

        assert_eq!(RelayResponse::with_data("42").data_text(), Some("42"));
    }
}
