//! Notification queue contract.
//!
//! Fire-and-forget side-effect channel: the directory service enqueues a
//! topic plus payload and moves on. Delivery, retries, and templating
//! happen in a worker outside this crate. With a single deliberate
//! exception (the password-reset topic, see the directory service), an
//! enqueue failure is logged and swallowed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::AuthResult;
use crate::error::AuthError;

/// Topic published when a user requests a password reset.
pub const TOPIC_USER_PASSWORD_RESET: &str = "user-password-reset";

/// Topic published when a user's password is changed.
pub const TOPIC_USER_PASSWORD_CHANGED: &str = "user-password-changed";

/// Topic published when a user's profile is updated.
pub const TOPIC_USER_PROFILE_UPDATED: &str = "user-profile-updated";

/// Backend transport for queued notifications.
#[async_trait]
pub trait QueueStorage: Send + Sync {
    /// Enqueues `payload` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be accepted by the
    /// transport.
    async fn enqueue(&self, topic: &str, payload: Value) -> AuthResult<()>;
}

/// Typed wrapper over a [`QueueStorage`] transport.
#[derive(Clone)]
pub struct QueueService {
    storage: Arc<dyn QueueStorage>,
}

impl QueueService {
    /// Creates a new queue service over the given transport.
    #[must_use]
    pub fn new(storage: Arc<dyn QueueStorage>) -> Self {
        Self { storage }
    }

    /// Serializes `payload` and enqueues it on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Queue`] if serialization or the transport
    /// fails.
    pub async fn add_object<T: Serialize>(&self, topic: &str, payload: &T) -> AuthResult<()> {
        let value = serde_json::to_value(payload).map_err(|e| AuthError::queue(e.to_string()))?;

        self.storage.enqueue(topic, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingQueue {
        messages: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl QueueStorage for RecordingQueue {
        async fn enqueue(&self, topic: &str, payload: Value) -> AuthResult<()> {
            self.messages
                .lock()
                .await
                .push((topic.to_string(), payload));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_add_object_serializes_payload() {
        let storage = Arc::new(RecordingQueue::default());
        let queue = QueueService::new(storage.clone());

        #[derive(Serialize)]
        struct Payload {
            email: String,
        }

        queue
            .add_object(
                TOPIC_USER_PROFILE_UPDATED,
                &Payload {
                    email: "peter@test.com".to_string(),
                },
            )
            .await
            .unwrap();

        let messages = storage.messages.lock().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "user-profile-updated");
        assert_eq!(messages[0].1["email"], "peter@test.com");
    }
}
