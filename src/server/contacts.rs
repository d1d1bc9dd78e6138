use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::AdminAuth;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::model::{Contact, ContactForm};

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactCreated {
    pub message: String,
    pub contact: Contact,
}

/// `POST /api/contact` (public).
pub async fn submit_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ContactCreated>)> {
    let Json(form) = payload.map_err(|r| AppError::validation("invalid_body", r.body_text()))?;
    let new_contact = form.validate()?;
    let contact = state.store.create_contact(new_contact).await?;
    info!(target: "vertocraft::api", "contact {} received", contact.id);
    Ok((
        StatusCode::CREATED,
        Json(ContactCreated { message: "Contact form submitted successfully".into(), contact }),
    ))
}

/// `GET /api/contacts` (admin).
pub async fn list_contacts(_admin: AdminAuth, State(state): State<AppState>) -> AppResult<Json<Vec<Contact>>> {
    Ok(Json(state.store.list_contacts().await?))
}
