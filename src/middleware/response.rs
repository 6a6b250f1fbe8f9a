use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Wrapper for API responses that automatically adds success envelope
///
/// Object payloads are merged into the envelope next to `success` and
/// `message`; any other payload is placed under `data`.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: Option<String>,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: None,
            status_code: None, // Default to 200 OK
        }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            data,
            message: None,
            status_code: Some(status_code),
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn envelope(self) -> Result<Value, serde_json::Error> {
        let mut envelope = Map::new();
        envelope.insert("success".to_string(), Value::Bool(true));
        if let Some(message) = self.message {
            envelope.insert("message".to_string(), Value::String(message));
        }

        match serde_json::to_value(&self.data)? {
            Value::Object(fields) => {
                for (key, value) in fields {
                    envelope.entry(key).or_insert(value);
                }
            }
            Value::Null => {}
            other => {
                envelope.insert("data".to_string(), other);
            }
        }

        Ok(Value::Object(envelope))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        match self.envelope() {
            Ok(envelope) => (status, Json(envelope)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Failed to serialize response data"
                    })),
                )
                    .into_response()
            }
        }
    }
}

// Convenience type aliases
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_payload_is_merged_into_envelope() {
        let body = ApiResponse::success(json!({"question_id": 7}))
            .with_message("Question published")
            .envelope()
            .unwrap();
        assert_eq!(
            body,
            json!({"success": true, "message": "Question published", "question_id": 7})
        );
    }

    #[test]
    fn payload_cannot_override_success_flag() {
        let body = ApiResponse::success(json!({"success": false, "n": 1})).envelope().unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["n"], 1);
    }

    #[test]
    fn non_object_payload_goes_under_data() {
        let body = ApiResponse::success(vec![1, 2, 3]).envelope().unwrap();
        assert_eq!(body, json!({"success": true, "data": [1, 2, 3]}));

        let body = ApiResponse::success(()).envelope().unwrap();
        assert_eq!(body, json!({"success": true}));
    }
}
