use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};

use super::AppState;
use super::json::ApiJson;
use crate::auth::CallerIdentity;
use crate::error::{Result, TravelAgentError};
use crate::extract::extract_flight_params;
use crate::models::chat::{ChatRequest, ChatResponse, ExtractParamsRequest};
use crate::models::common::BaseResponse;
use crate::models::hotel::{HotelSearchRequest, HotelSearchResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat/message", post(send_message))
        .route("/chat/flight-message", post(send_flight_message))
        .route("/chat/hotel-search", post(search_hotels_direct))
        .route(
            "/chat/conversation/:thread_id",
            get(get_conversation).delete(clear_conversation),
        )
        .route("/chat/extract-params", post(extract_params))
        .route("/chat/health", get(chat_health))
}

async fn send_message(
    State(state): State<AppState>,
    identity: CallerIdentity,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    handle_chat(&state, &identity, request, "message").await
}

/// Older clients post flight conversations here; it is the same agent.
async fn send_flight_message(
    State(state): State<AppState>,
    identity: CallerIdentity,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    handle_chat(&state, &identity, request, "flight-message").await
}

async fn handle_chat(
    state: &AppState,
    identity: &CallerIdentity,
    request: ChatRequest,
    endpoint: &'static str,
) -> Result<Json<ChatResponse>> {
    identity.authorize(&state.config.auth)?;
    state
        .rate_limiter
        .check_rate_limit(&identity.rate_limit_key())
        .await?;
    request.validate()?;

    let response = state.chat.process_message(&request).await;
    tracing::info!(
        endpoint,
        thread_id = %response.thread_id,
        needs_clarification = response.needs_clarification,
        "Agent response generated"
    );
    Ok(Json(response))
}

async fn search_hotels_direct(
    State(state): State<AppState>,
    identity: CallerIdentity,
    ApiJson(request): ApiJson<HotelSearchRequest>,
) -> Result<Json<HotelSearchResponse>> {
    identity.authorize(&state.config.auth)?;
    request.validate()?;
    tracing::info!(
        q = %request.q,
        check_in = %request.check_in_date,
        check_out = %request.check_out_date,
        "Direct hotel search"
    );

    let response = state.hotels.search_hotels(&request).await;
    tracing::info!(
        properties = response.properties().len(),
        "Hotel search completed"
    );
    Ok(Json(response))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<Value>> {
    let conversation = state
        .chat
        .agent()
        .get_state(&thread_id)
        .await
        .map_err(|e| TravelAgentError::Internal(format!("Failed to get conversation state: {e}")))?
        .ok_or_else(|| {
            TravelAgentError::NotFound(format!("Conversation thread {thread_id} not found"))
        })?;

    Ok(Json(json!({
        "status": "success",
        "thread_id": thread_id,
        "conversation_state": conversation,
    })))
}

async fn clear_conversation(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<BaseResponse>> {
    let cleared = state
        .chat
        .agent()
        .clear(&thread_id)
        .await
        .map_err(|e| TravelAgentError::Internal(format!("Failed to clear conversation: {e}")))?;

    let response = if cleared {
        BaseResponse::success(format!("Conversation {thread_id} cleared successfully"))
    } else {
        BaseResponse::error(format!("Failed to clear conversation {thread_id}"))
    };
    Ok(Json(response))
}

/// Debug view of the keyword extractor, not the agent.
async fn extract_params(ApiJson(request): ApiJson<ExtractParamsRequest>) -> Result<Json<Value>> {
    if request.message.is_empty() {
        return Err(TravelAgentError::BadRequest("Message is required".to_string()));
    }
    let params = extract_flight_params(&request.message);
    Ok(Json(json!({
        "status": "success",
        "message": request.message,
        "extracted_params": params,
    })))
}

async fn chat_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "travel-chat",
        "agent_model": state.chat.agent().model_name(),
        "capabilities": "flights,hotels",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use crate::agent::{ConversationMessage, ConversationState, MockAgentRuntime, ToolCallRecord};
    use crate::config::Config;
    use crate::error::TravelAgentError;
    use crate::models::hotel::{HotelProperty, HotelSearchResponse};
    use crate::provider::MockHotelSearchProvider;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    fn replying_agent(reply: &'static str) -> MockAgentRuntime {
        let mut agent = MockAgentRuntime::new();
        agent.expect_invoke().returning(move |_, message| {
            Ok(vec![
                ConversationMessage::user(message),
                ConversationMessage::assistant(reply),
            ])
        });
        agent
    }

    #[tokio::test]
    async fn chat_message_synthesizes_thread() {
        let state = state(
            replying_agent("Here are your flights."),
            MockHotelSearchProvider::new(),
            Config::default(),
        );
        let response = send(state, post_json("/chat/message", json!({ "message": "hi" }))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Here are your flights.");
        assert!(body["thread_id"].as_str().unwrap().starts_with("thread_"));
        assert_eq!(body["needs_clarification"], false);
    }

    #[tokio::test]
    async fn agent_failure_is_still_200() {
        let mut agent = MockAgentRuntime::new();
        agent
            .expect_invoke()
            .returning(|_, _| Err(TravelAgentError::Agent("model unavailable".into())));
        let state = state(agent, MockHotelSearchProvider::new(), Config::default());

        let response = send(
            state,
            post_json(
                "/chat/flight-message",
                json!({ "message": "hi", "thread_id": "thread_keep" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["thread_id"], "thread_keep");
        assert_eq!(body["needs_clarification"], true);
        assert!(body["message"].as_str().unwrap().contains("model unavailable"));
    }

    #[tokio::test]
    async fn empty_message_is_422() {
        let mut agent = MockAgentRuntime::new();
        agent.expect_invoke().times(0);
        let state = state(agent, MockHotelSearchProvider::new(), Config::default());

        let response = send(state, post_json("/chat/message", json!({ "message": "" }))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_body_lists_validation_errors() {
        let state = state(MockAgentRuntime::new(), MockHotelSearchProvider::new(), Config::default());
        let request = Request::post("/chat/message")
            .header("content-type", "application/json")
            .body(Body::from("{\"message\": "))
            .unwrap();

        let response = send(state, request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Request validation failed");
        assert_eq!(body["error_details"]["validation_errors"][0]["field"], "body");
        assert_eq!(body["error_details"]["validation_errors"][0]["type"], "json_invalid");
    }

    #[tokio::test]
    async fn rate_limit_applies_per_caller() {
        let mut config = Config::default();
        config.rate_limiter.max_requests = 1;
        let state = state(replying_agent("ok"), MockHotelSearchProvider::new(), config);

        let first = send(state.clone(), post_json("/chat/message", json!({ "message": "a" }))).await;
        assert_eq!(first.status(), StatusCode::OK);
        let second = send(state.clone(), post_json("/chat/message", json!({ "message": "b" }))).await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));

        let keyed = Request::post("/chat/message")
            .header("content-type", "application/json")
            .header("x-api-key", "k1")
            .body(Body::from(json!({ "message": "c" }).to_string()))
            .unwrap();
        assert_eq!(send(state, keyed).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn required_api_key_is_enforced() {
        let mut config = Config::default();
        config.auth.require_api_key = true;
        config.auth.valid_api_keys = vec!["k1".into()];
        let mut agent = MockAgentRuntime::new();
        agent.expect_invoke().times(0);
        let state = state(agent, MockHotelSearchProvider::new(), config);

        let response = send(state, post_json("/chat/message", json!({ "message": "hi" }))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn conversation_lookup() {
        let mut agent = MockAgentRuntime::new();
        agent.expect_get_state().returning(|thread_id| {
            if thread_id == "thread_known" {
                let messages = vec![
                    ConversationMessage::user("hi"),
                    ConversationMessage::assistant_with_tools(
                        "",
                        vec![ToolCallRecord {
                            id: "call_1".into(),
                            name: "get_airport_suggestions".into(),
                            args: json!({ "location_query": "paris" }),
                        }],
                    ),
                ];
                Ok(Some(ConversationState::from_messages(&messages, Some("cp_1".into()))))
            } else {
                Ok(None)
            }
        });
        let state = state(agent, MockHotelSearchProvider::new(), Config::default());

        let found = send(state.clone(), get("/chat/conversation/thread_known")).await;
        assert_eq!(found.status(), StatusCode::OK);
        let body = body_json(found).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["thread_id"], "thread_known");
        assert_eq!(body["conversation_state"]["messages"][0]["type"], "human");

        let missing = send(state, get("/chat/conversation/thread_gone")).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let body = body_json(missing).await;
        assert_eq!(body["message"], "Conversation thread thread_gone not found");
    }

    #[tokio::test]
    async fn clearing_reports_outcome() {
        let mut agent = MockAgentRuntime::new();
        agent
            .expect_clear()
            .returning(|thread_id| Ok(thread_id == "thread_known"));
        let state = state(agent, MockHotelSearchProvider::new(), Config::default());

        let delete = |uri: &str| Request::delete(uri).body(Body::empty()).unwrap();
        let body = body_json(send(state.clone(), delete("/chat/conversation/thread_known")).await).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Conversation thread_known cleared successfully");

        let body = body_json(send(state, delete("/chat/conversation/thread_other")).await).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Failed to clear conversation thread_other");
    }

    #[tokio::test]
    async fn extract_params_debug_endpoint() {
        let state = state(MockAgentRuntime::new(), MockHotelSearchProvider::new(), Config::default());

        let empty = send(state.clone(), post_json("/chat/extract-params", json!({}))).await;
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
        let body = body_json(empty).await;
        assert_eq!(body["message"], "Message is required");
        assert_eq!(body["error_code"], "HTTP_400");

        let response = send(
            state,
            post_json(
                "/chat/extract-params",
                json!({ "message": "Fly from Denver to Miami on 2026-03-01" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["extracted_params"]["departure_location"], "denver");
        assert_eq!(body["extracted_params"]["arrival_location"], "miami");
        assert_eq!(body["extracted_params"]["departure_date"], "2026-03-01");
    }

    #[tokio::test]
    async fn direct_hotel_search() {
        let mut hotels = MockHotelSearchProvider::new();
        hotels
            .expect_search_hotels()
            .withf(|request| request.q == "Paris")
            .times(1)
            .returning(|_| HotelSearchResponse {
                properties: vec![HotelProperty {
                    name: "Le Grand".into(),
                    ..HotelProperty::default()
                }],
                ..HotelSearchResponse::default()
            });
        let state = state(MockAgentRuntime::new(), hotels, Config::default());

        let response = send(
            state.clone(),
            post_json(
                "/chat/hotel-search",
                json!({ "q": "Paris", "check_in_date": "2026-02-01", "check_out_date": "2026-02-03" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["properties"][0]["name"], "Le Grand");

        let inverted = send(
            state,
            post_json(
                "/chat/hotel-search",
                json!({ "q": "Paris", "check_in_date": "2026-02-03", "check_out_date": "2026-02-01" }),
            ),
        )
        .await;
        assert_eq!(inverted.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn chat_health_names_model() {
        let mut agent = MockAgentRuntime::new();
        agent
            .expect_model_name()
            .return_const("gpt-4.1-mini".to_string());
        let state = state(agent, MockHotelSearchProvider::new(), Config::default());

        let body = body_json(send(state, get("/chat/health")).await).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "travel-chat");
        assert_eq!(body["agent_model"], "gpt-4.1-mini");
        assert_eq!(body["capabilities"], "flights,hotels");
    }
}
