pub mod agent;
pub mod api;
pub mod auth;
pub mod chat;
pub mod clarification;
pub mod config;
pub mod error;
pub mod extract;
pub mod location;
pub mod logging;
pub mod models;
pub mod provider;
pub mod rate_limit;
pub mod tools;

use std::sync::Arc;

use crate::agent::{InMemoryConversationStore, OpenAiChatModel, ReactAgent};
use crate::api::AppState;
use crate::chat::ChatService;
use crate::config::Config;
use crate::error::Result;
use crate::provider::SerpApiClient;
use crate::tools::{ToolSet, TravelTools};

/// Wires the production collaborators: one SerpAPI client shared by both
/// search domains, the OpenAI-backed agent and an in-memory thread store.
pub fn build_state(config: Arc<Config>) -> Result<AppState> {
    let serpapi = Arc::new(SerpApiClient::from_config(&config)?);
    let tools = TravelTools::new(serpapi.clone(), serpapi.clone(), ToolSet::Travel);
    let model = Arc::new(OpenAiChatModel::from_config(&config.openai));
    let store = Arc::new(InMemoryConversationStore::new());
    let agent = ReactAgent::new(model, tools, store, &config.agent);

    Ok(AppState::new(
        config,
        ChatService::new(Arc::new(agent)),
        serpapi,
    ))
}
