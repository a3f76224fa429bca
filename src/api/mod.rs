//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. The routes go through the same [`crate::service::SceneService`]
//! paths as WebSocket traffic, so a click or property write made here is
//! seen by every connected client.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "scratchomised-server",
        description = "Operator API of the Scratch scene sync server. The WebSocket endpoint is at `/`."
    ),
    paths(
        handlers::system::health_handler,
        handlers::objects::list_objects,
        handlers::objects::create_object,
        handlers::objects::set_property,
        handlers::clicks::click,
        handlers::sessions::list_sessions,
    ),
    components(schemas(crate::error::ErrorResponse, crate::error::ErrorBody)),
    tags(
        (name = "System", description = "Health"),
        (name = "Objects", description = "Scene snapshot and property writes"),
        (name = "Clicks", description = "Switch clicks broadcast to clients"),
        (name = "Sessions", description = "Connected WebSocket clients"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
///
/// `request_timeout` bounds every REST request; it is not applied to the
/// WebSocket route.
pub fn build_router(request_timeout: Duration) -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .layer(TimeoutLayer::new(request_timeout));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{ClickHub, ObjectId, ObjectKind, SceneEventBus, SceneGraph, SceneObject};
    use crate::service::SceneService;
    use crate::ws::SessionRegistry;

    fn state() -> AppState {
        let lamp = SceneObject::new(ObjectId::from("lamp"), "Lamp", ObjectKind::Light)
            .at(100.0, 100.0);
        let switch = SceneObject::new(ObjectId::from("sw"), "Wall", ObjectKind::Light)
            .with_catalog_id("Scopia#square-switch")
            .at(500.0, 500.0);
        let sofa = SceneObject::new(ObjectId::from("sofa"), "Sofa", ObjectKind::Piece);
        AppState {
            service: Arc::new(SceneService::new(
                Arc::new(SceneGraph::with_objects(vec![lamp, switch, sofa])),
                SceneEventBus::new(16),
                ClickHub::new(),
            )),
            sessions: Arc::new(SessionRegistry::new()),
            max_message_bytes: 1024 * 1024,
        }
    }

    async fn call(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> Response {
        let app = build_router(Duration::from_secs(5)).with_state(state.clone());
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        let Ok(request) = request else {
            panic!("request must build");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router is infallible");
        };
        response
    }

    async fn json_body(response: Response) -> Value {
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body must be readable");
        };
        let Ok(value) = serde_json::from_slice(&bytes) else {
            panic!("body must be JSON");
        };
        value
    }

    #[tokio::test]
    async fn health_reports_sessions() {
        let state = state();
        let response = call(&state, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["running_sessions"], 0);
    }

    #[tokio::test]
    async fn objects_lists_filtered_snapshot() {
        let state = state();
        let response = call(&state, "GET", "/api/v1/objects", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["objects"][0]["id"], "lamp");
        assert!(body["objects"][0]["color"].is_null());
    }

    #[tokio::test]
    async fn create_object_returns_created() {
        let state = state();
        let record = json!({"id": "spot", "name": "Spot", "kind": "light"});
        let response = call(&state, "POST", "/api/v1/objects", Some(record.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["object_id"], "spot");

        let again = call(&state, "POST", "/api/v1/objects", Some(record)).await;
        assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn set_property_parses_hex_color() {
        let state = state();
        let response = call(
            &state,
            "PUT",
            "/api/v1/objects/lamp/properties/color",
            Some(json!({"value": "#FF0000"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["value"], 16_711_680);
    }

    #[tokio::test]
    async fn set_property_errors_map_to_status() {
        let state = state();
        let null_name = call(
            &state,
            "PUT",
            "/api/v1/objects/lamp/properties/name",
            Some(json!({"value": "null"})),
        )
        .await;
        assert_eq!(null_name.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(null_name).await["error"]["code"], 4003);

        let read_only = call(
            &state,
            "PUT",
            "/api/v1/objects/lamp/properties/locked",
            Some(json!({"value": "true"})),
        )
        .await;
        assert_eq!(read_only.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let missing = call(
            &state,
            "PUT",
            "/api/v1/objects/ghost/properties/x",
            Some(json!({"value": 1})),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn click_switch_by_id_and_point() {
        let state = state();
        let by_id = call(&state, "POST", "/api/v1/clicks", Some(json!({"object_id": "sw"}))).await;
        assert_eq!(by_id.status(), StatusCode::OK);
        let body = json_body(by_id).await;
        assert_eq!(body["outcome"], "switched");
        assert_eq!(body["power"], 0.0);

        let by_point = call(&state, "POST", "/api/v1/clicks", Some(json!({"x": 505, "y": 495}))).await;
        assert_eq!(json_body(by_point).await["power"], 1.0);

        let lamp = call(&state, "POST", "/api/v1/clicks", Some(json!({"object_id": "lamp"}))).await;
        assert_eq!(json_body(lamp).await["outcome"], "ignored");
    }

    #[tokio::test]
    async fn click_requires_a_target() {
        let state = state();
        let response = call(&state, "POST", "/api/v1/clicks", Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sessions_start_empty() {
        let state = state();
        let response = call(&state, "GET", "/api/v1/sessions", None).await;
        assert_eq!(json_body(response).await["count"], 0);
    }
}
