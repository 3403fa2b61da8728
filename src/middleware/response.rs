use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Wrapper for API responses that automatically adds the success envelope.
///
/// Every success body is `{"success": true}` plus an optional `message`,
/// an optional `count` (list endpoints), and an optional `data` payload.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: Option<String>,
    pub count: Option<usize>,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            count: None,
            status_code: None, // Default to 200 OK
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            count: None,
            status_code: Some(StatusCode::CREATED),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl ApiResponse<()> {
    /// A bare `{success, message}` body, for deletes.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            count: None,
            status_code: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let mut envelope = Map::new();
        envelope.insert("success".to_string(), Value::Bool(true));

        if let Some(message) = self.message {
            envelope.insert("message".to_string(), Value::String(message));
        }
        if let Some(count) = self.count {
            envelope.insert("count".to_string(), json!(count));
        }
        if let Some(data) = self.data {
            match serde_json::to_value(&data) {
                Ok(value) => {
                    envelope.insert("data".to_string(), value);
                }
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "success": false,
                            "message": "Failed to serialize response data"
                        })),
                    )
                        .into_response();
                }
            }
        }

        (status, Json(Value::Object(envelope))).into_response()
    }
}

// Convenience type alias for handler signatures
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
