// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public intake endpoints: story submissions and magazine requests.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;

use crate::{
    error::ApiError,
    models::{CreatedResponse, MagazineRequestBody},
    state::AppState,
    storage::StorySubmission,
};

#[utoipa::path(
    post,
    path = "/api/submissions",
    request_body = StorySubmission,
    tag = "Intake",
    responses(
        (status = 200, body = CreatedResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorBody),
        (status = 500, description = "Storage failure", body = crate::error::ErrorBody)
    )
)]
pub async fn submit_story(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(payload) = body?;
    let id = state.drafts.submit(&payload, Utc::now()).await?;
    Ok(Json(CreatedResponse::new(id)))
}

#[utoipa::path(
    post,
    path = "/api/magazine-requests",
    request_body = MagazineRequestBody,
    tag = "Intake",
    responses(
        (status = 200, body = CreatedResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorBody),
        (status = 500, description = "Storage failure", body = crate::error::ErrorBody)
    )
)]
pub async fn request_magazine(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(payload) = body?;
    let record = state.requests.submit(&payload, Utc::now()).await?;
    Ok(Json(CreatedResponse::new(record.id)))
}
