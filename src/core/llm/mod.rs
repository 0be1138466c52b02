pub mod providers;
pub mod types;

use async_trait::async_trait;

use self::types::{AssistantSpec, Run, ToolOutput};

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("assistant API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected assistant API response: {0}")]
    Decode(String),
}

pub type AssistantResult<T> = Result<T, AssistantError>;

/// The hosted threads/runs service the run poller talks to.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Create an assistant with the given tool definitions and return its id.
    async fn create_assistant(&self, spec: &AssistantSpec) -> AssistantResult<String>;

    /// Create an empty conversation thread and return its id.
    async fn create_thread(&self) -> AssistantResult<String>;

    async fn add_user_message(&self, thread_id: &str, content: &str) -> AssistantResult<()>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> AssistantResult<Run>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> AssistantResult<Run>;

    /// Submit all outputs of one `requires_action` batch at once.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> AssistantResult<Run>;

    /// Text of the newest message in the thread, if it has any text content.
    async fn latest_message(&self, thread_id: &str) -> AssistantResult<Option<String>>;
}
