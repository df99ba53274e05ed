//! Conversation history seam.
//!
//! Persistence proper belongs to an external store; the core only needs an
//! append/query contract. The in-memory implementation backs tests and
//! single-process deployments.

use crate::agents::types::Role;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: Uuid,
    pub session_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends one message to a session's history.
    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<StoredMessage>;
    /// Returns a session's history in chronological order.
    async fn messages(&self, session_id: &str) -> Result<Vec<StoredMessage>>;
}

#[derive(Default)]
pub struct InMemoryHistoryStore {
    inner: Mutex<HashMap<String, Vec<StoredMessage>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<StoredMessage> {
        let message = StoredMessage {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .expect("history store poisoned")
            .entry(session_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn messages(&self, session_id: &str) -> Result<Vec<StoredMessage>> {
        Ok(self
            .inner
            .lock()
            .expect("history store poisoned")
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}
