use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::json;

use crate::apis::bedrock::TitanImage;
use crate::apis::line::LineMessaging;
use crate::apis::s3::S3Bucket;
use crate::error::Error;
use crate::pipeline::{Pipeline, SignedUrl};

pub static SIGNATURE_HEADER: &str = "x-line-signature";

pub type RelayPipeline = Pipeline<TitanImage, S3Bucket, LineMessaging>;

pub fn build(pipeline: Arc<RelayPipeline>) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/generate", post(generate))
        .route("/health", get(health))
        .with_state(pipeline)
}

async fn webhook(
    State(pipeline): State<Arc<RelayPipeline>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    respond(pipeline.handle_webhook(signature, &body).await)
}

async fn generate(State(pipeline): State<Arc<RelayPipeline>>, body: Bytes) -> Response {
    respond(pipeline.handle_direct(&body).await)
}

async fn health() -> &'static str {
    "ok"
}

fn respond(result: Result<SignedUrl, Error>) -> Response {
    match result {
        Ok(signed) => {
            (StatusCode::OK, Json(json!({ "presigned_url": signed.url }))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod test {
    use axum::body::to_bytes;
    use time::OffsetDateTime;

    use super::*;

    #[tokio::test]
    async fn test_success_response() {
        let response = respond(Ok(SignedUrl {
            url: "https://example.com/i.jpg?signature=abc".into(),
            expires_at: OffsetDateTime::now_utc(),
        }));

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            json!({ "presigned_url": "https://example.com/i.jpg?signature=abc" })
        );
    }

    #[tokio::test]
    async fn test_authentication_response_is_plain_text() {
        let response = respond(Err(Error::Authentication));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"signature verification failed");
    }

    #[tokio::test]
    async fn test_failure_response_is_json_string() {
        let response = respond(Err(Error::Generation("model unavailable".into())));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            serde_json::from_slice::<String>(&body).unwrap(),
            "image generation failed: model unavailable"
        );
    }
}
