use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blog_counters_api_types::ErrorResponse;

use crate::application::error::ErrorReport;

/// JSON error for the counter endpoints: `{ "error": "<message>" }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
    report: ErrorReport,
}

impl ApiError {
    pub fn bad_request(message: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
            report: ErrorReport::from_message(
                "infra::http::counters",
                StatusCode::BAD_REQUEST,
                message,
            ),
        }
    }

    /// A rejected request whose cause is worth logging but not returning.
    pub fn rejected(message: &'static str, cause: &dyn StdError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
            report: ErrorReport::from_error(
                "infra::http::counters",
                StatusCode::BAD_REQUEST,
                cause,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message.to_string(),
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_carries_report_for_logging() {
        let response = ApiError::bad_request("slug required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.messages, vec!["slug required".to_string()]);
    }
}
