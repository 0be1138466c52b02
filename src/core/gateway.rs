use serde::Serialize;
use tracing::{info, warn};

use crate::core::llm::AssistantError;
use crate::core::memory::types::Role;
use crate::core::memory::{HistoryStore, StoreError};
use crate::core::poller::{RunError, RunPoller};

/// Handle for one remote thread. Callers own it and pass it to every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    thread_id: String,
}

impl Conversation {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub thread_id: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub sender: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("history storage failed: {0}")]
    Store(#[from] StoreError),
    #[error("could not open a conversation: {0}")]
    Remote(#[from] AssistantError),
    #[error("{0}")]
    BadInput(String),
}

/// Accepts user text, runs it through the assistant and records both sides.
pub struct MessageGateway {
    poller: RunPoller,
    history: HistoryStore,
}

impl MessageGateway {
    pub fn new(poller: RunPoller, history: HistoryStore) -> Self {
        Self { poller, history }
    }

    pub async fn open_conversation(&self) -> Result<Conversation, GatewayError> {
        let thread_id = self.poller.client().create_thread().await?;
        self.history.ensure_thread(&thread_id).await?;
        info!("Opened conversation {}", thread_id);
        Ok(Conversation::new(thread_id))
    }

    pub async fn resume_conversation(&self, thread_id: &str) -> Result<Conversation, GatewayError> {
        let thread_id = thread_id.trim();
        if thread_id.is_empty() {
            return Err(GatewayError::BadInput("thread_id must not be empty".into()));
        }
        if !self.history.thread_exists(thread_id).await? {
            info!("Recording conversation {} started elsewhere", thread_id);
            self.history.ensure_thread(thread_id).await?;
        }
        Ok(Conversation::new(thread_id))
    }

    pub async fn send_message(
        &self,
        conversation: &Conversation,
        text: &str,
    ) -> Result<Reply, GatewayError> {
        if text.trim().is_empty() {
            return Err(GatewayError::BadInput("message must not be empty".into()));
        }
        let thread_id = conversation.thread_id();
        self.history.append(thread_id, Role::User, text).await?;

        let response = match self.poller.drive(conversation, text).await {
            Ok(response) => response,
            Err(e) => {
                warn!("No reply for thread {}: {}", thread_id, e);
                return Err(e.into());
            }
        };

        self.history
            .append(thread_id, Role::Assistant, &response)
            .await?;
        Ok(Reply {
            thread_id: thread_id.to_string(),
            response,
        })
    }

    pub async fn get_history(&self, thread_id: &str) -> Result<Vec<HistoryEntry>, GatewayError> {
        Ok(self
            .history
            .messages(thread_id)
            .await?
            .into_iter()
            .map(|m| HistoryEntry {
                sender: m.role,
                content: m.content,
            })
            .collect())
    }
}
