use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Room for the four uploads plus the scalar fields.
fn body_limit(state: &AppState) -> usize {
    let per_file = state.portal.config().uploads.max_file_bytes as usize;
    per_file.saturating_mul(4).saturating_add(1024 * 1024)
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/employees", get(handlers::list_employees))
        .route("/api/applications", post(handlers::submit_application))
        .route("/api/applications/status", post(handlers::lookup_status))
        .route("/api/applications/{id}", get(handlers::get_application))
        .route("/api/applications/{id}/status", post(handlers::update_status))
        .route("/api/applications/{id}/card.pdf", get(handlers::card_pdf))
        .route("/api/applications/{id}/card/{side}", get(handlers::card_preview))
        .route("/api/applications/{id}/summary.pdf", get(handlers::summary_pdf))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/file/{id}", get(handlers::get_file))
        .layer(DefaultBodyLimit::max(body_limit(&state)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use idportal::{Database, DocumentStore, Portal, PortalConfig, SqliteBackend};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(dir: &tempfile::TempDir) -> Router {
        let db = Database::open_in_memory().unwrap();
        let store = DocumentStore::new(dir.path(), db.clone());
        let portal = Portal::new(
            Arc::new(SqliteBackend::new(db)),
            store,
            PortalConfig::default(),
        )
        .unwrap();
        router(AppState::new(portal))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(
                Request::get("/api/employees?status=all")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "employees": [] }));
    }

    #[tokio::test]
    async fn test_reject_without_remark_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(post_json(
                "/api/applications/abc/status",
                json!({ "status": "rejected", "remark": "  " }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["field"], "remark");
    }

    #[tokio::test]
    async fn test_status_lookup_unknown_application() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(post_json(
                "/api/applications/status",
                json!({ "applicationId": "missing", "dateOfBirth": "1990-01-01" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "Application not found");
    }

    #[tokio::test]
    async fn test_unknown_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(
                Request::get("/api/file/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
