use serde::{Deserialize, Serialize};

use super::flight::FlightSearchResponse;
use super::travel::TravelSearchParams;
use crate::error::{Result, TravelAgentError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<()> {
        if self.message.is_empty() {
            return Err(TravelAgentError::field_validation(
                "message",
                "message must contain at least 1 character",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub thread_id: String,
    pub flight_results: Option<FlightSearchResponse>,
    pub hotel_results: Option<serde_json::Value>,
    pub extracted_params: Option<TravelSearchParams>,
    pub needs_clarification: bool,
    #[serde(default)]
    pub missing_params: Vec<String>,
}

impl ChatResponse {
    /// The reply returned whenever a turn fails inside the chat pipeline.
    pub fn apology(thread_id: String, error: &str) -> Self {
        Self {
            message: format!(
                "I apologize, but I encountered an error while processing your request: {error}. Please try again or rephrase your question."
            ),
            thread_id,
            flight_results: None,
            hotel_results: None,
            extracted_params: None,
            needs_clarification: true,
            missing_params: Vec::new(),
        }
    }
}

/// Body of the parameter extraction debug endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractParamsRequest {
    #[serde(default)]
    pub message: String,
}
