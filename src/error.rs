use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Everything that can go wrong between receiving a request and answering it.
///
/// Collaborator errors are stringified at the client boundary so SDK and
/// transport types never leak past their module.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("signature verification failed")]
    Authentication,
    #[error("{0} was not specified")]
    Configuration(&'static str),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("image generation failed: {0}")]
    Generation(String),
    #[error("storage failed: {0}")]
    Storage(String),
    #[error("reply dispatch failed: {0}")]
    Dispatch(String),
}

impl Error {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            // Rejected outright, plain text. An unverified request is not
            // treated as a real user message.
            Self::Authentication => {
                (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, Json(self.to_string())).into_response(),
        }
    }
}
