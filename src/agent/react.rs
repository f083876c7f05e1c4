use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Value, json};

use super::AgentRuntime;
use super::messages::{ConversationMessage, ConversationState, Role, ToolCallRecord};
use super::model::ChatModel;
use super::prompt::system_prompt;
use super::store::ConversationStore;
use crate::config::AgentConfig;
use crate::error::{Result, TravelAgentError};
use crate::tools::TravelTools;

/// Model/tool loop: call the model, run any tools it asks for, feed the
/// outputs back, and stop at the first reply without tool calls.
pub struct ReactAgent {
    model: Arc<dyn ChatModel>,
    tools: TravelTools,
    store: Arc<dyn ConversationStore>,
    max_iterations: usize,
    memory_limit: usize,
}

impl ReactAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: TravelTools,
        store: Arc<dyn ConversationStore>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            model,
            tools,
            store,
            max_iterations: config.max_iterations,
            memory_limit: config.memory_limit,
        }
    }

    async fn run_tool(&self, call: &ToolCallRecord) -> String {
        let started = Instant::now();
        let output = match &call.args {
            Value::String(raw) => json!({
                "error": format!("Invalid arguments for {}: {raw}", call.name)
            }),
            args => match self.tools.call(&call.name, args.clone()).await {
                Ok(output) => output,
                Err(e) => json!({ "error": e.to_string() }),
            },
        };
        tracing::info!(
            tool = %call.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            failed = output.get("error").is_some(),
            "Tool call finished"
        );
        output.to_string()
    }
}

/// Trailing slice of `history` shown to the model. At most `limit` messages,
/// starting at a user message so tool results never lose their call. When the
/// current turn alone is longer than `limit`, the whole turn is kept.
pub fn memory_window(history: &[ConversationMessage], limit: usize) -> &[ConversationMessage] {
    if history.len() <= limit {
        return history;
    }
    let start = history.len() - limit;
    if let Some(offset) = history[start..].iter().position(|m| m.role == Role::User) {
        return &history[start + offset..];
    }
    history
        .iter()
        .rposition(|m| m.role == Role::User)
        .map_or(history, |i| &history[i..])
}

#[async_trait]
impl AgentRuntime for ReactAgent {
    async fn invoke(&self, thread_id: &str, user_message: &str) -> Result<Vec<ConversationMessage>> {
        let mut history = self
            .store
            .load(thread_id)
            .await?
            .map(|thread| thread.messages)
            .unwrap_or_default();
        history.push(ConversationMessage::user(user_message));

        let specs = self.tools.specs();
        let system = ConversationMessage::system(system_prompt(chrono::Local::now().date_naive()));

        for iteration in 0..self.max_iterations {
            let mut prompt = Vec::with_capacity(self.memory_limit + 1);
            prompt.push(system.clone());
            prompt.extend_from_slice(memory_window(&history, self.memory_limit));

            let reply = self.model.complete(&prompt, &specs).await?;
            let content = reply.content.unwrap_or_default();

            if reply.tool_calls.is_empty() {
                history.push(ConversationMessage::assistant(content));
                self.store.save(thread_id, history.clone()).await?;
                tracing::debug!(%thread_id, iterations = iteration + 1, "Agent turn complete");
                return Ok(history);
            }

            let outputs = join_all(reply.tool_calls.iter().map(|call| self.run_tool(call))).await;
            history.push(ConversationMessage::assistant_with_tools(
                content,
                reply.tool_calls.clone(),
            ));
            for (call, output) in reply.tool_calls.iter().zip(outputs) {
                history.push(ConversationMessage::tool(call, output));
            }
        }

        self.store.save(thread_id, history).await?;
        Err(TravelAgentError::Agent(format!(
            "Agent stopped after {} iterations without a final answer",
            self.max_iterations
        )))
    }

    async fn get_state(&self, thread_id: &str) -> Result<Option<ConversationState>> {
        Ok(self
            .store
            .load(thread_id)
            .await?
            .map(|thread| ConversationState::from_messages(&thread.messages, thread.checkpoint_id)))
    }

    async fn clear(&self, thread_id: &str) -> Result<bool> {
        let removed = self.store.delete(thread_id).await?;
        tracing::info!(%thread_id, removed, "Conversation clear requested");
        Ok(removed)
    }

    fn model_name(&self) -> String {
        self.model.model_name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::model::ModelReply;
    use crate::agent::store::InMemoryConversationStore;
    use crate::provider::{MockFlightSearchProvider, MockHotelSearchProvider};
    use crate::tools::{SEARCH_FLIGHTS, ToolSet, ToolSpec};
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<Vec<ModelReply>>,
        seen: Mutex<Vec<Vec<ConversationMessage>>>,
    }

    impl ScriptedModel {
        fn new(mut replies: Vec<ModelReply>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            messages: &[ConversationMessage],
            _tools: &[ToolSpec],
        ) -> Result<ModelReply> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| TravelAgentError::Agent("script exhausted".into()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn text(reply: &str) -> ModelReply {
        ModelReply {
            content: Some(reply.to_string()),
            tool_calls: Vec::new(),
        }
    }

    fn call(name: &str, args: Value) -> ModelReply {
        ModelReply {
            content: None,
            tool_calls: vec![ToolCallRecord {
                id: "call_1".into(),
                name: name.into(),
                args,
            }],
        }
    }

    fn agent(model: Arc<ScriptedModel>, max_iterations: usize) -> ReactAgent {
        let mut flights = MockFlightSearchProvider::new();
        flights.expect_search_flights().times(0);
        let mut hotels = MockHotelSearchProvider::new();
        hotels.expect_search_hotels().times(0);
        let tools = TravelTools::new(Arc::new(flights), Arc::new(hotels), ToolSet::Travel);
        let config = AgentConfig {
            max_iterations,
            memory_limit: 20,
        };
        ReactAgent::new(model, tools, Arc::new(InMemoryConversationStore::new()), &config)
    }

    #[tokio::test]
    async fn plain_reply_ends_turn() {
        let model = Arc::new(ScriptedModel::new(vec![text("Where are you flying from?")]));
        let agent = agent(model.clone(), 5);

        let history = agent.invoke("t1", "I need a flight").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Assistant);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0][0].role, Role::System);
        assert_eq!(seen[0][1].content, "I need a flight");
    }

    #[tokio::test]
    async fn tool_output_is_fed_back() {
        let model = Arc::new(ScriptedModel::new(vec![
            call(
                SEARCH_FLIGHTS,
                json!({
                    "departure_location": "JFK",
                    "arrival_location": "LAX",
                    "departure_date": "2026-01-10"
                }),
            ),
            text("When would you like to return?"),
        ]));
        let agent = agent(model.clone(), 5);

        let history = agent.invoke("t1", "JFK to LAX on 2026-01-10").await.unwrap();
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert!(history[2].content.contains("Return date is required"));
        assert_eq!(history[2].tool_call_id.as_deref(), Some("call_1"));

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[1].last().unwrap().role, Role::Tool);
    }

    #[tokio::test]
    async fn malformed_arguments_become_error_output() {
        let model = Arc::new(ScriptedModel::new(vec![
            call(SEARCH_FLIGHTS, Value::String("{departure".into())),
            text("Sorry, could you repeat that?"),
        ]));
        let agent = agent(model, 5);

        let history = agent.invoke("t1", "fly").await.unwrap();
        assert!(history[2].content.contains("Invalid arguments for search_flights"));
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn iteration_limit_is_an_error() {
        let model = Arc::new(ScriptedModel::new(vec![
            call("get_airport_suggestions", json!({"location_query": "paris"})),
            call("get_airport_suggestions", json!({"location_query": "paris"})),
        ]));
        let agent = agent(model, 2);

        let err = agent.invoke("t1", "paris").await.unwrap_err();
        assert!(matches!(err, TravelAgentError::Agent(_)));
        let state = agent.get_state("t1").await.unwrap().expect("history kept");
        assert_eq!(state.messages.len(), 5);
    }

    #[tokio::test]
    async fn history_persists_across_turns_and_clears() {
        let model = Arc::new(ScriptedModel::new(vec![text("Hi!"), text("Paris it is.")]));
        let agent = agent(model.clone(), 5);

        agent.invoke("t1", "hello").await.unwrap();
        let history = agent.invoke("t1", "paris please").await.unwrap();
        assert_eq!(history.len(), 4);

        let state = agent.get_state("t1").await.unwrap().expect("state");
        assert_eq!(state.messages[0].kind, "human");
        assert_eq!(state.messages[1].kind, "ai");
        assert!(state.checkpoint_id.is_some());

        assert!(agent.clear("t1").await.unwrap());
        assert!(agent.get_state("t1").await.unwrap().is_none());
    }

    #[test]
    fn window_starts_at_user_message() {
        let call_record = ToolCallRecord {
            id: "c".into(),
            name: "x".into(),
            args: json!({}),
        };
        let history = vec![
            ConversationMessage::user("one"),
            ConversationMessage::assistant_with_tools("", vec![call_record.clone()]),
            ConversationMessage::tool(&call_record, "{}"),
            ConversationMessage::assistant("answer"),
            ConversationMessage::user("two"),
            ConversationMessage::assistant("answer two"),
        ];

        assert_eq!(memory_window(&history, 10).len(), 6);
        let window = memory_window(&history, 4);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "two");
        assert_eq!(memory_window(&history, 1)[0].content, "two");
    }
}
