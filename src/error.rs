use axum::Json;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::models::common::ErrorResponse;

/// Which upstream service an [`TravelAgentError::ExternalApi`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalApi {
    SerpApi,
    OpenAi,
}

impl std::fmt::Display for ExternalApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalApi::SerpApi => write!(f, "SerpAPI"),
            ExternalApi::OpenAi => write!(f, "OpenAI"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TravelAgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{api} API error: {message}")]
    ExternalApi {
        api: ExternalApi,
        message: String,
        status: Option<u16>,
    },

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Flight search error: {0}")]
    FlightSearch(String),

    #[error("Hotel search error: {0}")]
    HotelSearch(String),

    #[error("Parameter extraction error: {0}")]
    ParameterExtraction(String),

    #[error("Conversation error for thread {thread_id}: {message}")]
    Conversation { thread_id: String, message: String },

    #[error("Rate limit exceeded: {limit} requests per {window_seconds} seconds")]
    RateLimit { limit: u32, window_seconds: u32 },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("{message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TravelAgentError {
    pub fn validation(message: impl Into<String>) -> Self {
        TravelAgentError::Validation {
            field: None,
            message: message.into(),
        }
    }

    pub fn field_validation(field: &str, message: impl Into<String>) -> Self {
        TravelAgentError::Validation {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TravelAgentError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TravelAgentError::ExternalApi { .. } => StatusCode::BAD_GATEWAY,
            TravelAgentError::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TravelAgentError::FlightSearch(_)
            | TravelAgentError::HotelSearch(_)
            | TravelAgentError::ParameterExtraction(_)
            | TravelAgentError::Conversation { .. } => StatusCode::BAD_REQUEST,
            TravelAgentError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            TravelAgentError::Authentication(_) => StatusCode::UNAUTHORIZED,
            TravelAgentError::Authorization(_) => StatusCode::FORBIDDEN,
            TravelAgentError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TravelAgentError::ToolExecution { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            TravelAgentError::BadRequest(_) => StatusCode::BAD_REQUEST,
            TravelAgentError::NotFound(_) => StatusCode::NOT_FOUND,
            TravelAgentError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            TravelAgentError::Internal(_)
            | TravelAgentError::Json(_)
            | TravelAgentError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            TravelAgentError::Configuration(_) => "CONFIGURATION_ERROR",
            TravelAgentError::ExternalApi { .. } => "EXTERNAL_API_ERROR",
            TravelAgentError::Agent(_) => "AGENT_ERROR",
            TravelAgentError::FlightSearch(_) => "FLIGHT_SEARCH_ERROR",
            TravelAgentError::HotelSearch(_) => "HOTEL_SEARCH_ERROR",
            TravelAgentError::ParameterExtraction(_) => "PARAMETER_EXTRACTION_ERROR",
            TravelAgentError::Conversation { .. } => "CONVERSATION_ERROR",
            TravelAgentError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            TravelAgentError::Authentication(_) => "AUTHENTICATION_ERROR",
            TravelAgentError::Authorization(_) => "AUTHORIZATION_ERROR",
            TravelAgentError::Validation { .. } => "VALIDATION_ERROR",
            TravelAgentError::ToolExecution { .. } => "TOOL_EXECUTION_ERROR",
            TravelAgentError::BadRequest(_) => "HTTP_400",
            TravelAgentError::NotFound(_) => "HTTP_404",
            TravelAgentError::ServiceUnavailable(_) => "HTTP_503",
            TravelAgentError::Internal(_)
            | TravelAgentError::Json(_)
            | TravelAgentError::Other(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            TravelAgentError::ExternalApi { api, status, .. } => Some(serde_json::json!({
                "api_name": api.to_string(),
                "status_code": status,
            })),
            TravelAgentError::Conversation { thread_id, .. } => {
                Some(serde_json::json!({ "thread_id": thread_id }))
            }
            TravelAgentError::RateLimit {
                limit,
                window_seconds,
            } => Some(serde_json::json!({
                "limit": limit,
                "window_seconds": window_seconds,
            })),
            TravelAgentError::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            TravelAgentError::ToolExecution { tool, .. } => {
                Some(serde_json::json!({ "tool_name": tool }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for TravelAgentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        } else {
            tracing::warn!(error = %self, code = self.error_code(), "request rejected");
        }

        let mut headers = HeaderMap::new();
        if let TravelAgentError::RateLimit {
            limit,
            window_seconds,
        } = &self
        {
            headers.insert("Retry-After", HeaderValue::from(*window_seconds));
            headers.insert("X-RateLimit-Limit", HeaderValue::from(*limit));
            headers.insert("X-RateLimit-Window", HeaderValue::from(*window_seconds));
        }

        let body = ErrorResponse::new(self.to_string(), self.error_code(), self.details());
        (status, headers, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, TravelAgentError>;
