use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    /// Client-side problem (bad input, unknown id).
    Fail,
    /// Server-side problem (storage, serialization).
    Error,
}

/// Uniform `{status, code, data|message}` wrapper returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: Status,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self { status: Status::Success, code: StatusCode::OK.as_u16(), data: Some(data), message: None }
    }
}

impl Envelope<()> {
    pub fn failure(code: StatusCode, message: impl Into<String>) -> Self {
        let status = if code.is_server_error() { Status::Error } else { Status::Fail };
        Self { status, code: code.as_u16(), data: None, message: Some(message.into()) }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let code = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_carries_data_without_message() {
        let body = serde_json::to_value(Envelope::success(json!({"movie": {"id": 1}}))).unwrap();
        assert_eq!(body, json!({"status": "success", "code": 200, "data": {"movie": {"id": 1}}}));
    }

    #[test]
    fn client_failures_are_fail() {
        let body = serde_json::to_value(Envelope::failure(StatusCode::NOT_FOUND, "not found")).unwrap();
        assert_eq!(body, json!({"status": "fail", "code": 404, "message": "not found"}));
    }

    #[test]
    fn server_failures_are_error() {
        let env = Envelope::failure(StatusCode::INTERNAL_SERVER_ERROR, "data fetch failed");
        assert_eq!(env.status, Status::Error);
        assert_eq!(env.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
