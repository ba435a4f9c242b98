use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use rcp_handler::{HandlerRegistry, RendererRegistry};
use rcp_operations::OperationManager;
use rcp_orchestrator::NamespaceProvisioner;
use rcp_store::StateStore;
use tower_http::trace::TraceLayer;

use crate::auth::require_bearer_token;
use crate::handlers;
use crate::state::AppState;

#[allow(clippy::too_many_arguments)]
pub fn build_app(
    store: Arc<dyn StateStore>,
    handlers_registry: Arc<HandlerRegistry>,
    renderers_registry: Arc<RendererRegistry>,
    namespace: Arc<dyn NamespaceProvisioner>,
    bindings: Arc<rcp_graph::BindingMetadataRegistry>,
    auth_token: Arc<String>,
    api_base: String,
) -> Router {
    let operations = Arc::new(OperationManager::new(store.clone(), handlers_registry, renderers_registry, namespace, bindings));
    let state = AppState { store, operations, auth_token, api_base: Arc::new(api_base) };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route(
            "/applications",
            get(handlers::list_applications),
        )
        .route(
            "/applications/:application",
            get(handlers::get_application).put(handlers::put_application).delete(handlers::delete_application),
        )
        .route(
            "/applications/:application/components/:component",
            get(handlers::get_component).put(handlers::put_component).delete(handlers::delete_component),
        )
        .route(
            "/applications/:application/scopes/:scope",
            get(handlers::get_scope).put(handlers::put_scope).delete(handlers::delete_scope),
        )
        .route(
            "/applications/:application/deployments/:deployment",
            get(handlers::get_deployment).put(handlers::put_deployment).delete(handlers::delete_deployment),
        )
        .route(
            "/applications/:application/deployments/:deployment/operations",
            get(handlers::list_operations),
        )
        .route(
            "/applications/:application/deployments/:deployment/operationresults/:operation",
            get(handlers::get_operation_result),
        )
        .route("/events", get(handlers::list_events))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rcp_handler::{InMemoryHandler, InMemoryRenderer};
    use rcp_store::InMemoryStore;
    use tower::util::ServiceExt;

    const TEST_TOKEN: &str = "test-token";

    fn test_app() -> Router {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStore::new());
        let mut handlers_registry = HandlerRegistry::new();
        handlers_registry.register(Arc::new(InMemoryHandler::new("Container")));
        let mut renderers_registry = RendererRegistry::new();
        renderers_registry.register(Arc::new(InMemoryRenderer::new("Container", "Container")));
        build_app(
            store,
            Arc::new(handlers_registry),
            Arc::new(renderers_registry),
            Arc::new(rcp_orchestrator::NoopNamespaceProvisioner),
            Arc::new(rcp_graph::BindingMetadataRegistry::new()),
            Arc::new(TEST_TOKEN.to_string()),
            "http://127.0.0.1:8080".into(),
        )
    }

    fn authed(req: axum::http::request::Builder) -> axum::http::request::Builder {
        req.header("Authorization", format!("Bearer {}", TEST_TOKEN))
    }

    #[tokio::test]
    async fn unauthenticated_request_returns_401() {
        let app = test_app();
        let resp = app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_token_returns_401() {
        let app = test_app();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("Authorization", "Bearer wrong-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_returns_200() {
        let app = test_app();
        let resp = app.oneshot(authed(Request::builder().uri("/health")).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn application_not_found_returns_404() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/applications/nonexistent")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_application_returns_201_then_200_on_replay() {
        let app = test_app();
        let body = Body::from(serde_json::json!({"properties": {}}).to_string());
        let resp = app
            .clone()
            .oneshot(
                authed(
                    Request::builder()
                        .method("PUT")
                        .uri("/applications/my-app")
                        .header("content-type", "application/json"),
                )
                .body(body)
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = Body::from(serde_json::json!({"properties": {}}).to_string());
        let resp = app
            .oneshot(
                authed(
                    Request::builder()
                        .method("PUT")
                        .uri("/applications/my-app")
                        .header("content-type", "application/json"),
                )
                .body(body)
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn events_returns_200() {
        let app = test_app();
        let resp = app.oneshot(authed(Request::builder().uri("/events")).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
