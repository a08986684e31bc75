use crate::server::{AppContext, AppError};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hlsforged_common::Error;
use tokio_util::io::ReaderStream;

pub fn download_routes() -> Router<AppContext> {
    Router::new().route("/download/:filename", get(download))
}

/// Reject anything that could address a file outside the converted dir.
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.contains('\0')
}

async fn download(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    if !is_safe_filename(&filename) {
        return Err(Error::validation(format!("invalid file name: {filename:?}")).into());
    }

    let path = ctx.config.storage.converted_dir.join(&filename);
    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(expired_response(ctx.config.jobs.expiration_secs));
        }
        Err(e) => return Err(Error::from(e).into()),
    };
    let len = file.metadata().await.map_err(Error::from)?.len();

    tracing::debug!("Serving {:?} ({} bytes)", path, len);

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

fn expired_response(expiration_secs: u64) -> Response {
    let window = if expiration_secs % 60 == 0 {
        format!("{} minutes", expiration_secs / 60)
    } else {
        format!("{} seconds", expiration_secs)
    };
    let message = format!(
        "File not found. Converted files are deleted {window} after submission; \
         please submit the stream again."
    );

    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": message,
            "code": "not_found",
        })),
    )
        .into_response()
}
