//! HTTP surface: the axum router, the upload handler and error mapping.
//!
//! | Method | Path | Result |
//! |--------|------|--------|
//! | `POST` | `/convert_to_markdown/` | `text/plain` markdown |
//! | `GET`  | `/health` | `{"status":"ok","converter":"…"}` |
//!
//! Every [`Doc2MdError`] is turned into a response here; nothing escapes the
//! handler. Error bodies are JSON with a human-readable `detail` and a stable
//! `code`.

use crate::backend::Converter;
use crate::config::ServerConfig;
use crate::error::Doc2MdError;
use crate::pipeline::invoke::ConversionInvoker;
use crate::pipeline::receive::{receive, UploadedFile};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::TryStreamExt;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Name of the multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    invoker: ConversionInvoker,
    temp_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(config: &ServerConfig, converter: Arc<dyn Converter>) -> Self {
        Self {
            invoker: ConversionInvoker::new(
                converter,
                config.concurrency,
                config.conversion_timeout,
            ),
            temp_dir: Arc::new(config.temp_dir.clone()),
        }
    }
}

/// Build the application router around an explicitly supplied converter.
pub fn router(config: &ServerConfig, converter: Arc<dyn Converter>) -> Router {
    Router::new()
        .route("/convert_to_markdown/", post(convert_to_markdown))
        .route("/convert_to_markdown", post(convert_to_markdown))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(AppState::new(config, converter))
}

/// Bind `config.bind_addr` and serve until `shutdown` resolves.
pub async fn serve(
    config: &ServerConfig,
    converter: Arc<dyn Converter>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let converter_name = converter.name().to_string();
    let app = router(config, converter);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(
        address = %listener.local_addr()?,
        converter = %converter_name,
        temp_dir = %config.temp_dir.display(),
        "doc2md listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// `POST /convert_to_markdown/`
async fn convert_to_markdown(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, Doc2MdError> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.map_err(upload_error);
        let artifact = receive(&state.temp_dir, UploadedFile::new(filename, content)).await?;
        let markdown = state.invoker.convert(artifact).await?;

        return Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            markdown,
        )
            .into_response());
    }

    Err(Doc2MdError::MissingField { field: FILE_FIELD })
}

/// `GET /health`
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "converter": state.invoker.converter().name(),
    }))
}

fn upload_error(err: MultipartError) -> Doc2MdError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Doc2MdError::PayloadTooLarge(err.body_text())
    } else {
        Doc2MdError::MalformedUpload(err.body_text())
    }
}

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub code: &'static str,
}

impl Doc2MdError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Doc2MdError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Doc2MdError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.code(), "{}", self);
        } else {
            warn!(code = self.code(), "{}", self);
        }

        let body = ErrorBody {
            detail: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConverterError;

    #[test]
    fn status_mapping() {
        let cases = [
            (
                Doc2MdError::MissingExtension {
                    filename: "data".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Doc2MdError::MissingField { field: FILE_FIELD },
                StatusCode::BAD_REQUEST,
            ),
            (
                Doc2MdError::PayloadTooLarge("too big".into()),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                Doc2MdError::Conversion(ConverterError::Failed("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Doc2MdError::WorkerFailed("panic".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Doc2MdError::Timeout {
                    limit: std::time::Duration::from_secs(1),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn error_body_shape() {
        let body = ErrorBody {
            detail: "Conversion error: boom".into(),
            code: "CONVERSION_FAILED",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["detail"], "Conversion error: boom");
        assert_eq!(json["code"], "CONVERSION_FAILED");
    }
}
