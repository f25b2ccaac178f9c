//! HTTP relay in front of the background-removal backend.
//!
//! `POST /api/remove-bg` takes a multipart `image_file` field and answers with
//! PNG bytes or `{"error": "..."}`. Every failure is collapsed into one of
//! three fixed user-facing messages; the underlying cause is only logged.

use crate::config::RelayConfig;
use crate::removal::{BackgroundRemover, RemovalError, Upload, IMAGE_FIELD};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::instrument;

pub const MISSING_IMAGE: &str = "이미지 파일이 필요합니다.";
pub const MISSING_API_KEY: &str = "API 키가 설정되지 않았습니다.";
pub const REMOVAL_FAILED: &str = "배경 제거 처리 중 오류가 발생했습니다.";

pub const RESULT_FILE_NAME: &str = "removed-background.png";

/// JSON body of every non-200 relay response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("request has no image_file field")]
    MissingImage,
    #[error("REMOVEBG_API_KEY is not configured")]
    MissingApiKey,
    #[error("failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Removal(#[from] RemovalError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingImage => StatusCode::BAD_REQUEST,
            RelayError::MissingApiKey | RelayError::Multipart(_) | RelayError::Removal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            RelayError::MissingImage => MISSING_IMAGE,
            RelayError::MissingApiKey => MISSING_API_KEY,
            RelayError::Multipart(_) | RelayError::Removal(_) => REMOVAL_FAILED,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::MissingImage => tracing::warn!("Rejected upload: {}", self),
            _ => tracing::error!("Background removal failed: {}", self),
        }

        let body = ErrorBody {
            error: self.user_message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct RelayState {
    remover: Option<Arc<dyn BackgroundRemover>>,
}

impl RelayState {
    pub fn new(remover: Option<Arc<dyn BackgroundRemover>>) -> Self {
        Self { remover }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.remover())
    }
}

pub fn router(state: RelayState, body_limit: usize) -> Router {
    Router::new()
        .route("/api/remove-bg", post(remove_background))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C.
pub async fn serve(config: &RelayConfig) -> std::io::Result<()> {
    if !config.has_api_key() {
        tracing::warn!(
            "{} is not set; every upload will be answered with a 500",
            crate::config::API_KEY_ENV
        );
    }

    let app = router(RelayState::from_config(config), config.body_limit);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("Relay listening on http://{}", listener.local_addr()?);
    tracing::info!("Background removal: POST /api/remove-bg");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down relay");
}

#[instrument(skip_all)]
async fn remove_background(
    State(state): State<RelayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, RelayError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!("Not a multipart request: {}", rejection);
        RelayError::MissingImage
    })?;

    let upload = read_image_field(&mut multipart)
        .await?
        .ok_or(RelayError::MissingImage)?;
    tracing::info!(
        "Received image: {} bytes, type {}",
        upload.len(),
        upload.content_type.as_deref().unwrap_or("unknown")
    );

    let remover = state.remover.as_ref().ok_or(RelayError::MissingApiKey)?;
    let image = remover.remove(upload).await?;
    tracing::info!("{} returned {} bytes", remover.name(), image.len());

    let disposition = format!("attachment; filename=\"{RESULT_FILE_NAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        image,
    )
        .into_response())
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Option<Upload>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(Some(Upload {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
