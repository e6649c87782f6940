// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::role_gate,
    codec::{CollectionKind, Record},
    error::{ApiError, ErrorBody},
    models::{
        CollectionEnvelope, CreateSessionRequest, CreatedResponse, MagazineRequestBody,
        OkResponse, SessionStatus, WriteCollectionRequest,
    },
    state::AppState,
    storage::StorySubmission,
};

pub mod collections;
pub mod health;
pub mod session;
pub mod submissions;

pub fn router(state: AppState) -> Router {
    let gate = state.gate.clone();

    // Admin collection routes live below the gate prefix, so moving the
    // prefix moves them with it.
    let admin_api = Router::new()
        .route(
            "/{collection}",
            get(collections::list_all).put(collections::write),
        )
        .route("/{collection}/{key}", delete(collections::delete_entry));

    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route(
            "/api/session",
            get(session::status)
                .post(session::create)
                .delete(session::clear),
        )
        .route("/api/submissions", post(submissions::submit_story))
        .route(
            "/api/magazine-requests",
            post(submissions::request_magazine),
        )
        .route("/api/{collection}", get(collections::list_public))
        .nest(&format!("{}/api", state.config.gate.prefix), admin_api)
        .fallback(not_found)
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(gate, role_gate))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

async fn not_found() -> ApiError {
    ApiError::not_found("not found")
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        collections::list_public,
        collections::list_all,
        collections::write,
        collections::delete_entry,
        submissions::submit_story,
        submissions::request_magazine,
        session::status,
        session::create,
        session::clear
    ),
    components(
        schemas(
            Record,
            CollectionKind,
            CollectionEnvelope,
            WriteCollectionRequest,
            CreatedResponse,
            StorySubmission,
            MagazineRequestBody,
            CreateSessionRequest,
            SessionStatus,
            OkResponse,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Collections", description = "Public collection reads"),
        (name = "Admin", description = "Role-gated collection management"),
        (name = "Intake", description = "Public story submissions and magazine requests"),
        (name = "Session", description = "Session cookie issuance"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verifier::tests::{mint, now, token_with_roles, ISSUER, SECRET};
    use crate::auth::{StaticKeyResolver, TokenVerifier};
    use crate::config::AppConfig;
    use crate::storage::{BlobStore, MemoryBlobStore};
    use axum::{
        body::to_bytes,
        http::{header, Method, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state_with(store: Option<Arc<MemoryBlobStore>>) -> AppState {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let verifier = TokenVerifier::new(Arc::new(StaticKeyResolver::hmac(SECRET)), ISSUER);
        AppState::new(
            config,
            store.map(|s| s as Arc<dyn BlobStore>),
            verifier,
        )
    }

    fn app_with_prefix(prefix: &str) -> (Router, Arc<MemoryBlobStore>) {
        let prefix = prefix.to_string();
        let config = AppConfig::from_lookup(|name| (name == "GATE_PREFIX").then(|| prefix.clone()))
            .unwrap();
        let verifier = TokenVerifier::new(Arc::new(StaticKeyResolver::hmac(SECRET)), ISSUER);
        let store = Arc::new(MemoryBlobStore::new());
        let state = AppState::new(config, Some(store.clone() as Arc<dyn BlobStore>), verifier);
        (router(state), store)
    }

    fn app() -> (Router, Arc<MemoryBlobStore>) {
        let store = Arc::new(MemoryBlobStore::new());
        (router(state_with(Some(store.clone()))), store)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("admin_session={token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };
        app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    fn editor() -> String {
        token_with_roles(json!(["editor"]))
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (app, _store) = app();
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_documents_write_bodies_and_admin_paths() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("WriteCollectionRequest"));
        assert!(schemas.contains_key("Record"));
        assert!(doc.paths.paths.contains_key("/admin/api/{collection}"));
    }

    #[tokio::test]
    async fn unauthenticated_admin_page_redirects_to_sign_in() {
        let (app, _store) = app();
        let response = send(&app, Method::GET, "/admin/news", None, None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/auth?next=%2Fadmin%2Fnews");
    }

    #[tokio::test]
    async fn expired_token_redirects_like_no_cookie() {
        let (app, store) = app();
        let expired = mint(&json!({ "iss": ISSUER, "exp": now() - 3600, "groups": ["admin"] }));
        let response = send(&app, Method::GET, "/admin/api/news", Some(&expired), None).await;
        assert_eq!(location(&response), "/auth?next=%2Fadmin%2Fapi%2Fnews");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn roleless_token_redirects_to_pending() {
        let (app, _store) = app();
        let token = token_with_roles(json!(""));
        let response = send(&app, Method::GET, "/admin/api/news", Some(&token), None).await;
        assert_eq!(location(&response), "/auth/pending");
    }

    #[tokio::test]
    async fn wrong_role_redirects_to_unauthorized() {
        let (app, _store) = app();
        let token = token_with_roles(json!(["volunteer"]));
        let response = send(&app, Method::GET, "/admin/api/news", Some(&token), None).await;
        assert_eq!(location(&response), "/auth/unauthorized");
    }

    #[tokio::test]
    async fn missing_collection_reads_as_empty() {
        let (app, _store) = app();
        let response = send(&app, Method::GET, "/api/news", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "ok": true, "items": [] }));

        let token = token_with_roles(json!(["admin"]));
        let response = send(&app, Method::GET, "/admin/api/team", Some(&token), None).await;
        assert_eq!(response.headers()["x-robots-tag"], "noindex, nofollow");
        assert_eq!(json_body(response).await, json!({ "ok": true, "members": [] }));
    }

    #[tokio::test]
    async fn unconfigured_storage_reads_empty_but_refuses_writes() {
        let app = router(state_with(None));
        let response = send(&app, Method::GET, "/api/impact", None, None).await;
        assert_eq!(json_body(response).await, json!({ "ok": true, "items": [] }));

        let response = send(
            &app,
            Method::PUT,
            "/admin/api/news",
            Some(&editor()),
            Some(json!({ "items": [] })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "ok": false, "error": "storage is not configured" })
        );
    }

    #[tokio::test]
    async fn corrupt_documents_fail_writes_without_parser_detail() {
        let (app, store) = app();
        store.insert("content/magazines.json", b"{ \"items\": [ oops".to_vec());
        let response = send(
            &app,
            Method::PUT,
            "/admin/api/magazines",
            Some(&editor()),
            Some(json!({ "items": [{ "code": "M1" }] })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "ok": false, "error": "stored data is corrupt" })
        );
    }

    #[tokio::test]
    async fn admin_replace_then_public_list() {
        let (app, _store) = app();
        let response = send(
            &app,
            Method::PUT,
            "/admin/api/news",
            Some(&editor()),
            Some(json!({ "items": [
                { "id": "b", "order": 2, "titleEn": "Second" },
                { "id": "hidden", "order": 0, "visible": false },
                { "id": "a", "order": 1, "titleEn": "First", "extra": [1, 2] }
            ]})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["items"].as_array().unwrap().len(), 3);

        let body = json_body(send(&app, Method::GET, "/api/news", None, None).await).await;
        let ids: Vec<&str> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(body["items"][0]["extra"], json!([1, 2]));
    }

    #[tokio::test]
    async fn admin_routes_move_with_the_gate_prefix() {
        let (app, store) = app_with_prefix("/backoffice");
        let defacement = json!({ "items": [{ "id": "defaced", "titleEn": "pwned" }] });

        let response = send(&app, Method::PUT, "/admin/api/news", None, Some(defacement.clone())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, Method::PUT, "/backoffice/api/news", None, Some(defacement.clone())).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/auth?next=%2Fbackoffice%2Fapi%2Fnews");
        assert!(store.calls().is_empty());

        let response = send(
            &app,
            Method::PUT,
            "/backoffice/api/team",
            Some(&editor()),
            Some(json!({ "members": [] })),
        )
        .await;
        assert_eq!(location(&response), "/auth/unauthorized");

        let response = send(&app, Method::PUT, "/backoffice/api/news", Some(&editor()), Some(defacement)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-admin-gate"], "verified");
    }

    #[tokio::test]
    async fn team_writes_need_admin() {
        let (app, _store) = app();
        let response = send(
            &app,
            Method::PUT,
            "/admin/api/team",
            Some(&editor()),
            Some(json!({ "members": [] })),
        )
        .await;
        assert_eq!(location(&response), "/auth/unauthorized");
    }

    #[tokio::test]
    async fn magazines_merge_and_delete_by_code() {
        let (app, _store) = app();
        for code in ["M1", "M2"] {
            let response = send(
                &app,
                Method::PUT,
                "/admin/api/magazines",
                Some(&editor()),
                Some(json!({ "items": [{ "code": code }] })),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = send(&app, Method::DELETE, "/admin/api/magazines/M1", Some(&editor()), None).await;
        let body = json_body(response).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["code"], json!("M2"));

        let response = send(&app, Method::DELETE, "/admin/api/news/x", Some(&editor()), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"]
            .as_str()
            .unwrap()
            .contains("news"));
    }

    #[tokio::test]
    async fn bad_put_bodies_are_rejected() {
        let (app, store) = app();
        let response = send(
            &app,
            Method::PUT,
            "/admin/api/news",
            Some(&editor()),
            Some(json!({ "items": "nope" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_and_private_collections_are_not_found() {
        let (app, _store) = app();
        let response = send(&app, Method::GET, "/api/gallery", None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["ok"], json!(false));

        let response = send(&app, Method::GET, "/api/requests", None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submission_without_consent_is_rejected_before_storage() {
        let (app, store) = app();
        let response = send(
            &app,
            Method::POST,
            "/api/submissions",
            None,
            Some(json!({
                "fullName": "Maria",
                "email": "maria@example.org",
                "suco": "Becora",
                "municipality": "Dili",
                "storySummary": "A story",
                "permissionsConfirmed": false
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["ok"], json!(false));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn accepted_submission_is_hidden_draft() {
        let (app, store) = app();
        let response = send(
            &app,
            Method::POST,
            "/api/submissions",
            None,
            Some(json!({
                "fullName": "Maria",
                "email": "maria@example.org",
                "suco": "Becora",
                "municipality": "Dili",
                "storySummary": "A story",
                "permissionsConfirmed": true
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["id"].as_str().unwrap().starts_with("story-"));
        assert_eq!(store.keys_with_prefix("backups/impact/").len(), 1);

        let public = json_body(send(&app, Method::GET, "/api/impact", None, None).await).await;
        assert_eq!(public["items"], json!([]));
    }

    #[tokio::test]
    async fn malformed_json_body_uses_envelope() {
        let (app, _store) = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/submissions")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ nope"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["ok"], json!(false));
    }

    #[tokio::test]
    async fn magazine_requests_are_appended_and_admin_only() {
        let (app, _store) = app();
        let response = send(
            &app,
            Method::POST,
            "/api/magazine-requests",
            None,
            Some(json!({ "fullName": "Joana", "email": "j@example.org", "quantity": 3 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let id = json_body(response).await["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("request-"));

        let body = json_body(send(&app, Method::GET, "/admin/api/requests", Some(&editor()), None).await).await;
        assert_eq!(body["items"][0]["id"], json!(id));
        assert_eq!(body["items"][0]["quantity"], json!(3));
    }

    #[tokio::test]
    async fn session_cookie_lifecycle() {
        let (app, _store) = app();

        let response = send(&app, Method::POST, "/api/session", None, Some(json!({ "token": "a.b" }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let response = send(&app, Method::POST, "/api/session", None, Some(json!({ "token": "h.p.s" }))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("admin_session=h.p.s;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));

        let response = send(&app, Method::GET, "/api/session", Some("h.p.s"), None).await;
        let body = json_body(response).await;
        assert_eq!(body, json!({ "ok": true, "authenticated": true }));
        assert!(!body.to_string().contains("h.p.s"));

        let response = send(&app, Method::DELETE, "/api/session", None, None).await;
        let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn health_reports_components() {
        let (app, _store) = app();
        let response = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["checks"]["storage"], json!("memory"));
        assert_eq!(body["checks"]["keys"], json!("ok"));

        let degraded = router(state_with(None));
        let response = send(&degraded, Method::GET, "/health/ready", None, None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = send(&degraded, Method::GET, "/health/live", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (app, _store) = app();
        let response = send(&app, Method::GET, "/health/live", None, None).await;
        assert!(response.headers().contains_key("x-request-id"));
    }
}
