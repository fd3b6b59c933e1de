use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Envelope shared by every JSON response: `{success, message?, data?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success<T>(data: T) -> Response
where
    T: Serialize,
{
    respond(StatusCode::OK, Some(data), None)
}

pub fn success_with_message<T>(data: T, message: impl Into<String>) -> Response
where
    T: Serialize,
{
    respond(StatusCode::OK, Some(data), Some(message.into()))
}

pub fn created<T>(data: T, message: impl Into<String>) -> Response
where
    T: Serialize,
{
    respond(StatusCode::CREATED, Some(data), Some(message.into()))
}

pub fn error(message: impl Into<String>, status: StatusCode) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        message: Some(message.into()),
        data: None,
    };

    (status, Json(body)).into_response()
}

fn respond<T>(status: StatusCode, data: Option<T>, message: Option<String>) -> Response
where
    T: Serialize,
{
    let body = ApiResponse {
        success: true,
        message,
        data,
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_absent_fields() {
        let body: ApiResponse<()> = ApiResponse {
            success: false,
            message: Some("Event not found".to_string()),
            data: None,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "Event not found" })
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(success(1).status(), StatusCode::OK);
        assert_eq!(created(1, "done").status(), StatusCode::CREATED);
        assert_eq!(
            error("nope", StatusCode::FORBIDDEN).status(),
            StatusCode::FORBIDDEN
        );
    }
}
