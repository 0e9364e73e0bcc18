//! In-memory notification queue transport.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use gatehouse_auth::error::AuthError;
use gatehouse_auth::queue::QueueStorage;
use gatehouse_auth::AuthResult;

/// In-memory implementation of [`QueueStorage`].
///
/// Records every accepted message for assertion. Individual topics can be
/// made to fail, which is how tests exercise the one place where an
/// enqueue failure is fatal.
#[derive(Default)]
pub struct InMemoryQueueStorage {
    messages: Mutex<Vec<(String, Value)>>,
    fail_topics: RwLock<HashSet<String>>,
}

impl InMemoryQueueStorage {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes enqueues on `topic` fail from now on.
    pub async fn fail_topic(&self, topic: &str) {
        self.fail_topics.write().await.insert(topic.to_string());
    }

    /// Returns a snapshot of the accepted messages.
    pub async fn messages(&self) -> Vec<(String, Value)> {
        self.messages.lock().await.clone()
    }

    /// Returns the topics of the accepted messages, in order.
    pub async fn topics(&self) -> Vec<String> {
        self.messages
            .lock()
            .await
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }
}

#[async_trait]
impl QueueStorage for InMemoryQueueStorage {
    async fn enqueue(&self, topic: &str, payload: Value) -> AuthResult<()> {
        if self.fail_topics.read().await.contains(topic) {
            return Err(AuthError::queue(format!(
                "transport refused message on '{topic}'"
            )));
        }

        self.messages
            .lock()
            .await
            .push((topic.to_string(), payload));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_enqueue_records_messages_in_order() {
        let queue = InMemoryQueueStorage::new();

        queue.enqueue("first", json!(1)).await.unwrap();
        queue.enqueue("second", json!(2)).await.unwrap();

        assert_eq!(queue.topics().await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_failed_topic_rejects_only_that_topic() {
        let queue = InMemoryQueueStorage::new();
        queue.fail_topic("dead").await;

        let err = queue.enqueue("dead", json!(null)).await.unwrap_err();
        assert!(matches!(err, AuthError::Queue { .. }));

        queue.enqueue("alive", json!(null)).await.unwrap();
        assert_eq!(queue.topics().await, vec!["alive"]);
    }
}
