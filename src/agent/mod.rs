pub mod messages;
pub mod model;
pub mod prompt;
pub mod react;
pub mod store;

use async_trait::async_trait;

use crate::error::Result;

pub use messages::{ConversationMessage, ConversationState, Role, ToolCallRecord};
pub use model::{ChatModel, ModelReply, OpenAiChatModel};
pub use react::ReactAgent;
pub use store::{ConversationStore, InMemoryConversationStore};

#[cfg(test)]
use mockall::automock;

/// The reasoning loop behind the chat endpoints. It owns tool invocation and
/// conversation memory; callers only see the resulting thread history.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AgentRuntime: Send + Sync + 'static {
    /// Runs one user turn and returns the full thread history after it.
    async fn invoke(&self, thread_id: &str, user_message: &str) -> Result<Vec<ConversationMessage>>;

    async fn get_state(&self, thread_id: &str) -> Result<Option<ConversationState>>;

    /// Drops the thread's history. Returns whether anything was removed.
    async fn clear(&self, thread_id: &str) -> Result<bool>;

    fn model_name(&self) -> String;
}
