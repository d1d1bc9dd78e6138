//! Portfolio endpoints. Reads are public; create and delete require `AdminAuth`.
//!
//! Create is multipart: the `image` part is streamed to the uploads directory as
//! it arrives, the text parts are collected into a `PortfolioForm`, and only then
//! is the form validated and the record written. Any failure after the image hits
//! disk discards it before the error is returned.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::auth::AdminAuth;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::model::{PortfolioForm, PortfolioItem, ALL_CATEGORIES};
use crate::uploads::{StoredUpload, UploadDir};

pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Default, Deserialize)]
pub struct PortfolioQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioDeleted {
    pub message: String,
    pub id: i64,
}

fn parse_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::validation("invalid_id", format!("invalid portfolio id '{}'", raw)))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::too_large("payload_too_large", err.body_text())
    } else {
        AppError::validation("invalid_body", err.body_text())
    }
}

/// `GET /api/portfolio[?category=<tag>]` (public). `all` or an empty value means no filter.
pub async fn list_portfolio_items(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> AppResult<Json<Vec<PortfolioItem>>> {
    let mut items = state.store.list_portfolio_items().await?;
    if let Some(cat) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty() && *c != ALL_CATEGORIES) {
        let cat = cat.to_ascii_lowercase();
        items.retain(|i| i.category == cat);
    }
    Ok(Json(items))
}

/// `GET /api/portfolio/{id}` (public).
pub async fn get_portfolio_item(State(state): State<AppState>, Path(raw_id): Path<String>) -> AppResult<Json<PortfolioItem>> {
    let id = parse_id(&raw_id)?;
    match state.store.get_portfolio_item(id).await? {
        Some(item) => Ok(Json(item)),
        None => Err(AppError::not_found("not_found", format!("portfolio item {} not found", id))),
    }
}

/// `POST /api/portfolio` (admin, multipart).
pub async fn create_portfolio_item(
    admin: AdminAuth,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<PortfolioItem>)> {
    let mut multipart = multipart.map_err(|r| AppError::validation("invalid_body", r.body_text()))?;

    let mut form = PortfolioForm::default();
    let mut image: Option<StoredUpload> = None;
    if let Err(e) = read_parts(&state.uploads, &mut multipart, &mut form, &mut image).await {
        if let Some(img) = image {
            img.discard().await;
        }
        return Err(e);
    }

    let image = match image {
        Some(img) if !img.is_empty() => img,
        Some(img) => {
            img.discard().await;
            return Err(AppError::validation("missing_image", "image file is empty"));
        }
        None => return Err(AppError::validation("missing_image", "an image file is required")),
    };

    let new_item = match form.validate(image.public_path().to_string()) {
        Ok(item) => item,
        Err(e) => {
            image.discard().await;
            return Err(e);
        }
    };

    match state.store.create_portfolio_item(new_item).await {
        Ok(item) => {
            info!(target: "vertocraft::api", "portfolio item {} created by '{}' ({})", item.id, admin.username, item.image);
            Ok((StatusCode::CREATED, Json(item)))
        }
        Err(e) => {
            image.discard().await;
            Err(e.into())
        }
    }
}

/// Drain the multipart body. The image part is written to disk as it streams;
/// on error, whatever was stored so far is left in `image` for the caller to discard.
async fn read_parts(
    uploads: &UploadDir,
    multipart: &mut Multipart,
    form: &mut PortfolioForm,
    image: &mut Option<StoredUpload>,
) -> AppResult<()> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name != IMAGE_FIELD {
            let value = field.text().await.map_err(multipart_error)?;
            form.set_field(&name, value);
            continue;
        }
        if image.is_some() {
            return Err(AppError::validation("invalid_body", "only one image may be uploaded"));
        }
        let file_name = field.file_name().map(str::to_string);
        let mut pending = uploads.begin(file_name.as_deref()).await?;
        loop {
            match field.chunk().await {
                Ok(Some(bytes)) => {
                    if let Err(e) = pending.write(&bytes).await {
                        pending.abort().await;
                        return Err(e.into());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    pending.abort().await;
                    return Err(multipart_error(e));
                }
            }
        }
        *image = Some(pending.finish().await?);
    }
    Ok(())
}

/// `DELETE /api/portfolio/{id}` (admin). The image is removed after the record;
/// a failed image removal is logged and does not change the response.
pub async fn delete_portfolio_item(
    admin: AdminAuth,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<PortfolioDeleted>> {
    let id = parse_id(&raw_id)?;
    let not_found = || AppError::not_found("not_found", format!("portfolio item {} not found", id));
    let item = state.store.get_portfolio_item(id).await?.ok_or_else(not_found)?;
    if !state.store.delete_portfolio_item(id).await? {
        // Removed by a concurrent request between the read and the delete.
        warn!(target: "vertocraft::api", "portfolio item {} vanished before delete", id);
        return Err(not_found());
    }
    state.uploads.remove_public(&item.image).await;
    info!(target: "vertocraft::api", "portfolio item {} deleted by '{}'", id, admin.username);
    Ok(Json(PortfolioDeleted { message: "Portfolio item deleted".into(), id }))
}
