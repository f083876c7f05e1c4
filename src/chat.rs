use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::agent::{AgentRuntime, ConversationMessage, Role};
use crate::clarification::analyze_reply;
use crate::error::{Result, TravelAgentError};
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::models::flight::FlightSearchParams;
use crate::models::hotel::HotelSearchParams;
use crate::models::travel::{TravelParamsAccumulator, TravelSearchParams};
use crate::tools::{SEARCH_FLIGHTS, SEARCH_HOTELS};

pub fn new_thread_id() -> String {
    format!("thread_{}", Uuid::new_v4())
}

/// Runs chat turns through the agent and shapes the result for the API.
#[derive(Clone)]
pub struct ChatService {
    agent: Arc<dyn AgentRuntime>,
}

impl ChatService {
    pub fn new(agent: Arc<dyn AgentRuntime>) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &Arc<dyn AgentRuntime> {
        &self.agent
    }

    /// Never fails: any error inside the turn becomes an apology reply on the
    /// same thread with `needs_clarification` set.
    pub async fn process_message(&self, request: &ChatRequest) -> ChatResponse {
        let thread_id = request
            .thread_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(new_thread_id);

        match self.run_turn(&thread_id, &request.message).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(%thread_id, error = %e, "Error processing message");
                let reason = match e {
                    TravelAgentError::Agent(message) => message,
                    other => other.to_string(),
                };
                ChatResponse::apology(thread_id, &reason)
            }
        }
    }

    async fn run_turn(&self, thread_id: &str, message: &str) -> Result<ChatResponse> {
        let preview: String = message.chars().take(100).collect();
        tracing::info!(%thread_id, message = %preview, "Processing message");

        let messages = self.agent.invoke(thread_id, message).await?;
        if messages.is_empty() {
            return Err(TravelAgentError::Agent("No response from agent".to_string()));
        }
        let reply = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .ok_or_else(|| TravelAgentError::Agent("No AI response found".to_string()))?;

        let analysis = analyze_reply(&reply.content);
        Ok(ChatResponse {
            message: reply.content.clone(),
            thread_id: thread_id.to_string(),
            flight_results: None,
            hotel_results: None,
            extracted_params: extract_search_params(&messages),
            needs_clarification: analysis.needs_clarification,
            missing_params: analysis.missing_params,
        })
    }
}

/// Rebuilds the search parameters from the search tool calls recorded in
/// `messages`, oldest first.
pub fn extract_search_params(messages: &[ConversationMessage]) -> Option<TravelSearchParams> {
    let mut acc = TravelParamsAccumulator::new();
    for call in messages.iter().flat_map(|m| m.tool_calls.iter()) {
        match call.name.as_str() {
            SEARCH_FLIGHTS => acc.absorb_flight(flight_params_from_args(&call.args)),
            SEARCH_HOTELS => acc.absorb_hotel(hotel_params_from_args(&call.args)),
            _ => {}
        }
    }
    acc.finish()
}

fn text_arg(args: &Value, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn int_arg(args: &Value, key: &str) -> Option<i64> {
    match args.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flight_params_from_args(args: &Value) -> FlightSearchParams {
    let defaults = FlightSearchParams::default();
    FlightSearchParams {
        departure_location: text_arg(args, "departure_location"),
        arrival_location: text_arg(args, "arrival_location"),
        departure_date: text_arg(args, "departure_date"),
        return_date: text_arg(args, "return_date"),
        passengers: int_arg(args, "passengers").unwrap_or(defaults.passengers),
        trip_type: text_arg(args, "trip_type").unwrap_or(defaults.trip_type),
        travel_class: text_arg(args, "travel_class").unwrap_or(defaults.travel_class),
    }
}

fn hotel_params_from_args(args: &Value) -> HotelSearchParams {
    let defaults = HotelSearchParams::default();
    HotelSearchParams {
        location: text_arg(args, "location"),
        check_in_date: text_arg(args, "check_in_date"),
        check_out_date: text_arg(args, "check_out_date"),
        guests: int_arg(args, "guests").unwrap_or(defaults.guests),
        rooms: int_arg(args, "rooms").unwrap_or(defaults.rooms),
        hotel_class: text_arg(args, "hotel_class"),
        amenities: defaults.amenities,
        max_price: int_arg(args, "max_price"),
        vacation_rental: args
            .get("vacation_rental")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.vacation_rental),
    }
}
