use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::controller::{UploadController, ViewState};
use crate::model::{ImageFile, PreviewId};
use crate::page;

pub type SharedController = Arc<UploadController>;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("Invalid upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Preview not found")]
    PreviewNotFound,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match self {
            WebError::Multipart(_) => StatusCode::BAD_REQUEST,
            WebError::PreviewNotFound => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(controller: SharedController, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/select", post(select_handler))
        .route("/clear", post(clear_handler))
        .route("/analyze", post(analyze_handler))
        .route("/dismiss", post(dismiss_handler))
        .route("/preview/:id", get(preview_handler))
        .route("/api/state", get(state_handler))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(controller)
        .route("/health", get(health_check))
}

async fn index(State(controller): State<SharedController>) -> Html<String> {
    Html(page::render(&controller.snapshot()))
}

async fn select_handler(
    State(controller): State<SharedController>,
    mut multipart: Multipart,
) -> Result<Redirect, WebError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;

        // An empty file input still submits the field, without a name.
        if file_name.is_empty() && bytes.is_empty() {
            debug!("Upload form submitted without a file");
            break;
        }
        if !controller.select_file(ImageFile::new(file_name, content_type, bytes)) {
            warn!("Rejected upload that is not an image");
        }
        break;
    }

    Ok(Redirect::to("/"))
}

async fn clear_handler(State(controller): State<SharedController>) -> Redirect {
    controller.clear_selection();
    Redirect::to("/")
}

async fn analyze_handler(State(controller): State<SharedController>) -> Redirect {
    // Runs detached so a closed browser tab does not cancel the upload.
    let task = controller.clone();
    tokio::spawn(async move {
        task.request_prediction().await;
    });
    wait_until_started(&controller).await;
    Redirect::to("/")
}

/// Lets the spawned analysis set its loading flag before the redirect is
/// followed, so the next render already shows the analyzing state.
async fn wait_until_started(controller: &UploadController) {
    for _ in 0..10 {
        tokio::task::yield_now().await;
        if controller.snapshot().loading {
            break;
        }
    }
}

async fn dismiss_handler(State(controller): State<SharedController>) -> Redirect {
    controller.dismiss_error();
    Redirect::to("/")
}

async fn preview_handler(
    State(controller): State<SharedController>,
    Path(id): Path<u64>,
) -> Result<Response, WebError> {
    let (content_type, bytes) = controller
        .preview(PreviewId(id))
        .ok_or(WebError::PreviewNotFound)?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
            (header::CONTENT_DISPOSITION, "inline".to_string()),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            // Uploaded SVGs must not run scripts on this origin.
            (header::CONTENT_SECURITY_POLICY, "sandbox".to_string()),
        ],
        bytes,
    )
        .into_response())
}

async fn state_handler(State(controller): State<SharedController>) -> Json<ViewState> {
    Json(controller.snapshot())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}
