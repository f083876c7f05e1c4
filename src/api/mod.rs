pub mod chat;
pub mod health;
pub mod json;
pub mod middleware;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::chat::ChatService;
use crate::config::{Config, CorsConfig};
use crate::provider::HotelSearchProvider;
use crate::rate_limit::RateLimiter;

/// Shared handles for every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat: ChatService,
    pub hotels: Arc<dyn HotelSearchProvider>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Arc<Config>, chat: ChatService, hotels: Arc<dyn HotelSearchProvider>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limiter.max_requests,
            config.rate_limiter.window_seconds,
        ));
        Self {
            config,
            chat,
            hotels,
            rate_limiter,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);
    let body_limit = DefaultBodyLimit::max(state.config.server.max_request_size);
    let timeout = timeout_layer(&state.config);

    Router::new()
        .route("/", get(root))
        .merge(health::routes())
        .merge(chat::routes())
        .layer(body_limit)
        .layer(timeout)
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .with_state(state)
}

/// Answers 408 once a request runs past `server.request_timeout_seconds`.
pub fn timeout_layer(config: &Config) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, config.request_timeout())
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    let server = &state.config.server;
    Json(json!({
        "name": server.title,
        "version": server.version,
        "description": server.description,
        "docs_url": server.debug.then_some("/docs"),
        "health_url": "/health",
    }))
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == "*")
}

/// Builds the CORS layer from the configured lists. `*` in a list means any.
/// Credentials are only allowed when nothing is a wildcard.
pub fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let origins = if is_wildcard(&cfg.origins) {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            cfg.origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };
    let methods = if is_wildcard(&cfg.methods) {
        AllowMethods::from(Any)
    } else {
        AllowMethods::list(
            cfg.methods
                .iter()
                .filter_map(|m| Method::from_bytes(m.to_uppercase().as_bytes()).ok()),
        )
    };
    let headers = if is_wildcard(&cfg.headers) {
        AllowHeaders::from(Any)
    } else {
        AllowHeaders::list(
            cfg.headers
                .iter()
                .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok()),
        )
    };

    let explicit = !is_wildcard(&cfg.origins) && !is_wildcard(&cfg.methods) && !is_wildcard(&cfg.headers);
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(explicit)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::agent::MockAgentRuntime;
    use crate::provider::MockHotelSearchProvider;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use tower::ServiceExt;

    pub fn state(agent: MockAgentRuntime, hotels: MockHotelSearchProvider, config: Config) -> AppState {
        AppState::new(
            Arc::new(config),
            ChatService::new(Arc::new(agent)),
            Arc::new(hotels),
        )
    }

    pub async fn send(state: AppState, request: Request<Body>) -> Response {
        router(state).oneshot(request).await.unwrap()
    }

    pub async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{body_json, send, state};
    use super::{CorsConfig, cors_layer};
    use crate::agent::MockAgentRuntime;
    use crate::config::Config;
    use crate::provider::MockHotelSearchProvider;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn root_describes_service() {
        let state = state(MockAgentRuntime::new(), MockHotelSearchProvider::new(), Config::default());
        let response = send(state, super::test_support::get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Travel Agent API");
        assert_eq!(body["health_url"], "/health");
        assert_eq!(body["docs_url"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let state = state(MockAgentRuntime::new(), MockHotelSearchProvider::new(), Config::default());
        let request = axum::http::Request::get("/health/live")
            .header("x-request-id", "req-42")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = send(state, request).await;
        assert_eq!(
            response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("req-42")
        );
    }

    #[tokio::test]
    async fn slow_requests_time_out() {
        use std::time::Duration;
        use tower::ServiceExt;

        let mut config = Config::default();
        config.server.request_timeout_seconds = 0;
        let slow = axum::Router::new()
            .route(
                "/slow",
                axum::routing::get(|| async {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    "late"
                }),
            )
            .layer(super::timeout_layer(&config));

        let response = slow
            .oneshot(super::test_support::get("/slow"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn wildcard_cors_builds() {
        let cfg = CorsConfig {
            origins: vec!["*".into()],
            methods: vec!["*".into()],
            headers: vec!["*".into()],
        };
        let _ = cors_layer(&cfg);
        let _ = cors_layer(&CorsConfig::default());
    }
}
