use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;

use super::AppState;
use crate::error::{AppError, AppResult};
use crate::uploads::content_type_for;

/// `GET /uploads/{file}`: stored portfolio images.
pub async fn serve_upload(State(state): State<AppState>, Path(file): Path<String>) -> AppResult<impl IntoResponse> {
    let missing = || AppError::not_found("not_found", format!("no such upload '{}'", file));
    let path = state.uploads.resolve_public(&file).ok_or_else(missing)?;
    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing()),
        Err(e) => return Err(e.into()),
    };
    Ok((
        [(CONTENT_TYPE, content_type_for(&file)), (CACHE_CONTROL, "public, max-age=86400")],
        bytes,
    ))
}
