use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;

use crate::api::models::ErrorBody;
use crate::capabilities::CapabilityError;
use crate::report::ReportError;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("capability failure: {0}")]
    Capability(#[from] CapabilityError),
    #[error("session store failure: {0}")]
    Session(SessionError),
    #[error("report failure: {0}")]
    Report(#[from] ReportError),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            // The session was ended by a concurrent request mid-operation.
            SessionError::NotFound(id) => ApiError::NotFound(format!("Session {} not found", id)),
            other => ApiError::Session(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Capability(_) => StatusCode::BAD_GATEWAY,
            ApiError::Session(_) | ApiError::Report(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Capability(_) => {
                error!("{}", self);
                "Analysis service unavailable. Please try again later.".to_string()
            }
            _ => {
                error!("{}", self);
                "Internal server error".to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { detail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn internal_errors_do_not_leak_details() {
        let err = ApiError::from(SessionError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/secret/path",
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = actix_web::body::to_bytes(err.error_response().into_body())
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("Internal server error"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let err = ApiError::from(SessionError::NotFound("abc".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
