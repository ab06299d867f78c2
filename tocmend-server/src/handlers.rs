//! HTTP request handlers.

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use tocmend_core::RepairReport;

use crate::types::{ErrorResponse, HealthResponse};
use crate::AppState;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Repair the TOC of an uploaded document and return the result as a
/// downloadable attachment.
///
/// The upload lands in the downloads directory under a request-unique name,
/// the pipeline runs against an exclusive engine session on a blocking
/// thread, and the transformed container is streamed back. Pipeline faults
/// surface as a structured `{error, traceback}` payload.
pub async fn update_toc(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let (filename, bytes) = match read_file_part(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return bad_request("No file uploaded"),
        Err(e) => return bad_request(&format!("Malformed upload: {e}")),
    };
    if filename.is_empty() {
        return bad_request("No selected file");
    }

    let request_id = uuid::Uuid::new_v4().simple().to_string();
    let input_path = state
        .config
        .server
        .downloads_dir
        .join(format!("input_{request_id}.md"));
    let output_path = state
        .config
        .server
        .downloads_dir
        .join(format!("updated_{request_id}.md"));

    if let Err(e) = tokio::fs::write(&input_path, &bytes).await {
        log::error!("failed to store upload at {}: {e}", input_path.display());
        return server_error(&anyhow::anyhow!("failed to store upload: {e}"));
    }

    // One exclusive engine session per request; the pipeline is synchronous
    // and runs to completion off the async workers.
    let engine = state.engine.clone();
    let config = state.config.clone();
    let pipeline_in = input_path.clone();
    let pipeline_out = output_path.clone();
    let joined = tokio::task::spawn_blocking(move || -> anyhow::Result<RepairReport> {
        let session = engine.acquire_session()?;
        session
            .repair(&pipeline_in, &pipeline_out, &config)
            .map_err(Into::into)
    })
    .await;

    let result = match joined {
        Ok(result) => result,
        Err(e) => {
            log::error!("pipeline task panicked: {e}");
            return server_error(&anyhow::anyhow!("pipeline task failed: {e}"));
        }
    };

    match result {
        Ok(report) => {
            for outcome in report.degraded() {
                log::warn!(
                    "request {request_id}: {} {}",
                    outcome.step.name(),
                    outcome.status
                );
            }
            match tokio::fs::read(&output_path).await {
                Ok(body) => attachment(&filename, body),
                Err(e) => {
                    log::error!("output vanished at {}: {e}", output_path.display());
                    server_error(&anyhow::anyhow!("failed to read output: {e}"))
                }
            }
        }
        Err(e) => {
            log::error!("request {request_id} failed: {e:#}");
            server_error(&e)
        }
    }
}

/// Pull the `file` part out of the multipart form.
async fn read_file_part(
    multipart: &mut Multipart,
) -> Result<Option<(String, Bytes)>, axum::extract::multipart::MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Some((filename, bytes)));
    }
    Ok(None)
}

fn attachment(original_name: &str, body: Vec<u8>) -> Response {
    // Header values must stay visible ASCII.
    let download_name: String = format!("updated_{original_name}")
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"')
        .collect();
    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "text/markdown; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{download_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::message(message)),
    )
        .into_response()
}

fn server_error(err: &anyhow::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::from_failure(err)),
    )
        .into_response()
}
