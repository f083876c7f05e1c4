use async_trait::async_trait;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;

use crate::models::common::{ErrorResponse, ValidationErrorDetail};

/// JSON body extractor whose rejections use the service's 422 error body.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection_response(&rejection)),
        }
    }
}

fn rejection_kind(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "value_error",
        JsonRejection::JsonSyntaxError(_) => "json_invalid",
        JsonRejection::MissingJsonContentType(_) => "missing_content_type",
        _ => "body_error",
    }
}

fn rejection_response(rejection: &JsonRejection) -> Response {
    tracing::warn!(error = %rejection.body_text(), "Request validation failed");
    validation_failed(vec![ValidationErrorDetail {
        field: "body".to_string(),
        message: rejection.body_text(),
        kind: rejection_kind(rejection).to_string(),
    }])
}

pub fn validation_failed(errors: Vec<ValidationErrorDetail>) -> Response {
    let body = ErrorResponse::new(
        "Request validation failed",
        "VALIDATION_ERROR",
        Some(serde_json::json!({ "validation_errors": errors })),
    );
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}
