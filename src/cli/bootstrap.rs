use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::gateway::MessageGateway;
use crate::core::llm::AssistantClient;
use crate::core::llm::providers::OpenAiAssistants;
use crate::core::llm::types::AssistantSpec;
use crate::core::memory::{HistoryStore, TaskStore};
use crate::core::poller::{RetryPolicy, RunPoller};
use crate::tools::{Providers, ToolDispatcher, tool_definitions};

pub fn build_providers(config: &AppConfig) -> Result<Arc<Providers>> {
    Ok(Arc::new(
        Providers::from_config(&config.providers).context("building provider HTTP client")?,
    ))
}

/// Reuse the configured assistant or register a new one with our tools.
async fn resolve_assistant(client: &dyn AssistantClient, config: &AppConfig) -> Result<String> {
    if let Some(id) = &config.assistant.assistant_id {
        info!("Using existing assistant {}", id);
        return Ok(id.clone());
    }

    let spec = AssistantSpec {
        name: config.assistant.name.clone(),
        instructions: config.assistant.instructions.clone(),
        model: config.assistant.model.clone(),
        tools: tool_definitions(),
    };
    let id = client
        .create_assistant(&spec)
        .await
        .context("creating remote assistant")?;
    info!("Created assistant {} ({})", id, spec.name);
    Ok(id)
}

/// Wire stores, tools, the remote client and the poller into a gateway.
pub async fn build_gateway(config: &AppConfig) -> Result<MessageGateway> {
    if config.assistant.api_key.trim().is_empty() {
        bail!("No assistant API key configured. Set OPENAI_API_KEY or [assistant].api_key.");
    }

    let tasks = TaskStore::open(&config.storage.tasks_db_path)?;
    let history = HistoryStore::open(&config.storage.history_db_path)?;
    let providers = build_providers(config)?;

    let client: Arc<dyn AssistantClient> = Arc::new(
        OpenAiAssistants::new(
            config.assistant.api_key.clone(),
            config.assistant.base_url.clone(),
            config.assistant.request_timeout(),
        )
        .context("building assistant HTTP client")?,
    );
    let assistant_id = resolve_assistant(client.as_ref(), config).await?;

    let poller = RunPoller::new(
        client,
        Arc::new(ToolDispatcher::new(providers, tasks)),
        assistant_id,
        RetryPolicy::from_config(&config.polling),
    );
    Ok(MessageGateway::new(poller, history))
}
