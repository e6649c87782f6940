// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session cookie endpoints.
//!
//! None of these verify the token. The gate does that on every protected
//! request.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use tracing::debug;

use crate::{
    error::ApiError,
    models::{CreateSessionRequest, OkResponse, SessionStatus},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/session",
    tag = "Session",
    responses((status = 200, body = SessionStatus))
)]
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionStatus> {
    Json(SessionStatus {
        ok: true,
        authenticated: state.cookie.read(&headers).is_some(),
    })
}

#[utoipa::path(
    post,
    path = "/api/session",
    request_body = CreateSessionRequest,
    tag = "Session",
    responses(
        (status = 200, description = "Cookie set", body = OkResponse),
        (status = 400, description = "Token is not shaped like a JWT", body = crate::error::ErrorBody)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let cookie = state.cookie.issue(&request.token).ok_or_else(|| {
        debug!("Rejected session token failing the shape check");
        ApiError::bad_request("invalid token")
    })?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(OkResponse::new()),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/session",
    tag = "Session",
    responses((status = 200, description = "Cookie cleared", body = OkResponse))
)]
pub async fn clear(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, state.cookie.clear())]),
        Json(OkResponse::new()),
    )
}
