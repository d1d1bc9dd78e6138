//! Admin authentication: the login endpoint and the `AdminAuth` extractor that
//! gates admin-only routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AppState;
use crate::error::{AppError, AppResult};
use crate::security::{decode_basic, issue_token};

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Argon2 verification is CPU-bound; keep it off the async workers.
pub async fn check_credentials(state: &AppState, username: &str, password: &str) -> bool {
    let validator = state.validator.clone();
    let (u, p) = (username.to_string(), password.to_string());
    tokio::task::spawn_blocking(move || validator.validate(&u, &p))
        .await
        .unwrap_or(false)
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(payload) = payload.map_err(|r| AppError::validation("invalid_body", r.body_text()))?;
    if !check_credentials(&state, &payload.username, &payload.password).await {
        warn!(target: "vertocraft::auth", "login rejected for user '{}'", payload.username);
        return Err(AppError::unauthorized());
    }
    info!(target: "vertocraft::auth", "login ok for user '{}'", payload.username);
    Ok(Json(LoginResponse { token: issue_token(&payload.username, &payload.password) }))
}

/// Proof that the request carried valid admin credentials. Put it first in a
/// handler's argument list so it runs before any body is read.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub username: String,
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(AppError::unauthorized)?;
        let (username, password) = decode_basic(header).ok_or_else(AppError::unauthorized)?;
        if !check_credentials(state, &username, &password).await {
            warn!(target: "vertocraft::auth", "admin request rejected: {} {}", parts.method, parts.uri.path());
            return Err(AppError::unauthorized());
        }
        Ok(AdminAuth { username })
    }
}
