use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::messages::ConversationMessage;
use crate::error::Result;

/// Persisted history of one thread. `checkpoint_id` changes on every save.
#[derive(Debug, Clone, Default)]
pub struct StoredThread {
    pub messages: Vec<ConversationMessage>,
    pub checkpoint_id: Option<String>,
}

/// Key-value conversation memory keyed by thread id.
///
/// Turns on the same thread are not serialized here: two concurrent turns
/// both load the same history and the later save wins.
#[async_trait]
pub trait ConversationStore: Send + Sync + 'static {
    async fn load(&self, thread_id: &str) -> Result<Option<StoredThread>>;
    async fn save(&self, thread_id: &str, messages: Vec<ConversationMessage>) -> Result<StoredThread>;
    /// Returns whether the thread existed.
    async fn delete(&self, thread_id: &str) -> Result<bool>;
}

#[derive(Default)]
pub struct InMemoryConversationStore {
    threads: RwLock<HashMap<String, StoredThread>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, thread_id: &str) -> Result<Option<StoredThread>> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, messages: Vec<ConversationMessage>) -> Result<StoredThread> {
        let thread = StoredThread {
            messages,
            checkpoint_id: Some(Uuid::new_v4().to_string()),
        };
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), thread.clone());
        Ok(thread)
    }

    async fn delete(&self, thread_id: &str) -> Result<bool> {
        Ok(self.threads.write().await.remove(thread_id).is_some())
    }
}
