// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Collection read and write endpoints.
//!
//! Public reads serve visible records sorted by `order`. Admin endpoints sit
//! under the gated prefix and see everything in stored order.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use tracing::info;

use crate::{
    auth::SessionIdentity,
    codec::CollectionKind,
    error::ApiError,
    models::{CollectionEnvelope, CollectionResponse, WriteCollectionRequest},
    state::AppState,
};

fn parse_collection(name: &str) -> Result<CollectionKind, ApiError> {
    name.parse::<CollectionKind>().map_err(ApiError::not_found)
}

fn actor(identity: &Option<Extension<SessionIdentity>>) -> &str {
    identity
        .as_ref()
        .map(|Extension(identity)| identity.subject.as_str())
        .unwrap_or("anonymous")
}

#[utoipa::path(
    get,
    path = "/api/{collection}",
    params(("collection" = String, Path, description = "news, impact, team, magazines or samples")),
    tag = "Collections",
    responses(
        (status = 200, body = CollectionEnvelope),
        (status = 404, body = crate::error::ErrorBody)
    )
)]
pub async fn list_public(
    Path(collection): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CollectionResponse>, ApiError> {
    let kind = parse_collection(&collection)?;
    if !kind.is_public() {
        return Err(ApiError::not_found(format!("unknown collection: {collection}")));
    }
    let records = state.repository.list_visible(kind).await?;
    Ok(Json(CollectionResponse::new(kind, records)))
}

#[utoipa::path(
    get,
    path = "/admin/api/{collection}",
    params(("collection" = String, Path, description = "Collection name")),
    tag = "Admin",
    responses(
        (status = 200, body = CollectionEnvelope),
        (status = 307, description = "Gate redirect")
    )
)]
pub async fn list_all(
    Path(collection): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CollectionResponse>, ApiError> {
    let kind = parse_collection(&collection)?;
    let records = state.repository.list(kind).await?;
    Ok(Json(CollectionResponse::new(kind, records)))
}

/// Replace-all or merge-by-key depending on the collection.
#[utoipa::path(
    put,
    path = "/admin/api/{collection}",
    params(("collection" = String, Path, description = "Collection name")),
    request_body = WriteCollectionRequest,
    tag = "Admin",
    responses(
        (status = 200, body = CollectionEnvelope),
        (status = 400, body = crate::error::ErrorBody),
        (status = 500, body = crate::error::ErrorBody)
    )
)]
pub async fn write(
    Path(collection): Path<String>,
    State(state): State<AppState>,
    identity: Option<Extension<SessionIdentity>>,
    body: Result<Json<WriteCollectionRequest>, JsonRejection>,
) -> Result<Json<CollectionResponse>, ApiError> {
    let kind = parse_collection(&collection)?;
    let Json(body) = body?;
    let items = body.into_items(kind).ok_or_else(|| {
        ApiError::bad_request(format!(
            "expected {{\"{}\": [...]}}",
            kind.canonical_field()
        ))
    })?;

    let records = state.repository.save(kind, &items).await?;
    info!(collection = %kind, records = records.len(), actor = actor(&identity), "Collection saved");
    Ok(Json(CollectionResponse::new(kind, records)))
}

/// Remove one natural key from a merge-by-key collection.
#[utoipa::path(
    delete,
    path = "/admin/api/{collection}/{key}",
    params(
        ("collection" = String, Path, description = "magazines or samples"),
        ("key" = String, Path, description = "Natural key (code) to remove")
    ),
    tag = "Admin",
    responses(
        (status = 200, body = CollectionEnvelope),
        (status = 400, body = crate::error::ErrorBody)
    )
)]
pub async fn delete_entry(
    Path((collection, key)): Path<(String, String)>,
    State(state): State<AppState>,
    identity: Option<Extension<SessionIdentity>>,
) -> Result<Json<CollectionResponse>, ApiError> {
    let kind = parse_collection(&collection)?;
    let records = state.repository.remove(kind, &key).await?;
    info!(collection = %kind, key = %key, actor = actor(&identity), "Collection entry removed");
    Ok(Json(CollectionResponse::new(kind, records)))
}
