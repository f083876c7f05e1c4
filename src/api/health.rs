use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};

use super::AppState;
use crate::config::Config;
use crate::error::{Result, TravelAgentError};
use crate::location::airport_suggestions;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
        .route("/health/ready", get(readiness_check))
        .route("/health/live", get(liveness_check))
}

fn configured(present: bool) -> &'static str {
    if present { "configured" } else { "missing" }
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    let openai = configured(config.has_openai_key());
    let serpapi = configured(config.has_serpapi_key());
    let serpapi_service = if config.has_serpapi_key() {
        "healthy"
    } else {
        "not_configured"
    };
    let status = if config.has_openai_key() && config.has_serpapi_key() {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "timestamp": Utc::now().to_rfc3339(),
        "version": config.server.version,
        "dependencies": {
            "openai": openai,
            "serpapi": serpapi,
            "serpapi_service": serpapi_service,
        },
    }))
}

/// Probe of the location lookup the search tools depend on.
fn serpapi_check(config: &Config) -> Value {
    if config.has_serpapi_key() {
        let found = airport_suggestions("NYC").len();
        json!({
            "status": "healthy",
            "test_result": format!("Found {found} suggestions for NYC"),
        })
    } else {
        json!({ "status": "not_configured", "error": "API key not set" })
    }
}

async fn detailed_health_check(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    let environment = json!({
        "OPENAI_API_KEY": config.has_openai_key(),
        "SERPAPI_API_KEY": config.has_serpapi_key(),
    });
    let serpapi = serpapi_check(config);

    let status = if config.has_openai_key() && serpapi["status"] == "healthy" {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "timestamp": Utc::now().to_rfc3339(),
        "service": "travel-agent-backend",
        "version": config.server.version,
        "status": status,
        "checks": {
            "environment": environment,
            "services": { "serpapi": serpapi },
        },
    }))
}

async fn readiness_check(State(state): State<AppState>) -> Result<Json<Value>> {
    if !state.config.has_openai_key() {
        return Err(TravelAgentError::ServiceUnavailable(
            "OpenAI API key not configured".to_string(),
        ));
    }
    if !state.config.has_serpapi_key() {
        return Err(TravelAgentError::ServiceUnavailable(
            "SerpAPI key not configured".to_string(),
        ));
    }
    Ok(Json(json!({
        "status": "ready",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

async fn liveness_check() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
