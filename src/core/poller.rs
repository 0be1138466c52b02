use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::core::config::PollingConfig;
use crate::core::gateway::Conversation;
use crate::core::llm::types::{Run, RunStatus, ToolOutput};
use crate::core::llm::{AssistantClient, AssistantError, AssistantResult};
use crate::tools::{ToolError, ToolExecutor};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("run {run_id} failed: {message}")]
    Failed { run_id: String, message: String },
    #[error("run did not finish after {attempts} polls ({elapsed:?})")]
    TimedOut { attempts: u32, elapsed: Duration },
    #[error("run {run_id} completed without a text reply")]
    EmptyReply { run_id: String },
    #[error(transparent)]
    Remote(#[from] AssistantError),
}

/// How long and how often a run is polled.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub poll_interval: Duration,
    pub max_poll_interval: Duration,
    pub backoff_factor: f64,
    pub max_attempts: u32,
    pub deadline: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_poll_interval: Duration::from_millis(
                config.max_poll_interval_ms.max(config.poll_interval_ms),
            ),
            backoff_factor: config.backoff_factor.max(1.0),
            max_attempts: config.max_attempts.max(1),
            deadline: Duration::from_secs(config.deadline_secs.max(1)),
        }
    }

    pub fn next_delay(&self, current: Duration) -> Duration {
        current
            .mul_f64(self.backoff_factor)
            .min(self.max_poll_interval)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

/// Drives one remote run to completion, answering its tool calls locally.
pub struct RunPoller {
    client: Arc<dyn AssistantClient>,
    tools: Arc<dyn ToolExecutor>,
    assistant_id: String,
    policy: RetryPolicy,
}

impl RunPoller {
    pub fn new(
        client: Arc<dyn AssistantClient>,
        tools: Arc<dyn ToolExecutor>,
        assistant_id: String,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            tools,
            assistant_id,
            policy,
        }
    }

    pub fn client(&self) -> &Arc<dyn AssistantClient> {
        &self.client
    }

    pub async fn drive(
        &self,
        conversation: &Conversation,
        user_message: &str,
    ) -> Result<String, RunError> {
        let thread_id = conversation.thread_id();
        let started = Instant::now();
        let mut attempts: u32 = 0;

        self.remote(started, attempts, self.client.add_user_message(thread_id, user_message))
            .await?;
        let mut run = self
            .remote(started, attempts, self.client.create_run(thread_id, &self.assistant_id))
            .await?;
        info!("Run {} started on thread {}", run.id, thread_id);

        let mut delay = self.policy.poll_interval;

        loop {
            match run.status {
                RunStatus::Completed => {
                    info!("Run {} completed after {} rounds", run.id, attempts);
                    return self
                        .remote(started, attempts, self.client.latest_message(thread_id))
                        .await?
                        .ok_or(RunError::EmptyReply { run_id: run.id });
                }
                ref status if status.is_failure() => {
                    let message = run.error_message();
                    warn!("Run {} ended as {:?}: {}", run.id, status, message);
                    return Err(RunError::Failed {
                        run_id: run.id,
                        message,
                    });
                }
                _ => {}
            }

            // Submit rounds and polls share one budget.
            let elapsed = started.elapsed();
            if attempts >= self.policy.max_attempts || elapsed >= self.policy.deadline {
                warn!("Run {} still {:?}, giving up", run.id, run.status);
                return Err(RunError::TimedOut { attempts, elapsed });
            }
            attempts += 1;

            if run.status == RunStatus::RequiresAction && !run.pending_tool_calls().is_empty() {
                let outputs = self.answer_tool_calls(&run).await;
                run = self
                    .remote(
                        started,
                        attempts,
                        self.client.submit_tool_outputs(thread_id, &run.id, &outputs),
                    )
                    .await?;
                delay = self.policy.poll_interval;
                continue;
            }

            tokio::time::sleep(delay).await;
            delay = self.policy.next_delay(delay);
            run = self
                .remote(started, attempts, self.client.retrieve_run(thread_id, &run.id))
                .await?;
        }
    }

    /// Await a remote call, giving up once the run's deadline has passed.
    async fn remote<T>(
        &self,
        started: Instant,
        attempts: u32,
        call: impl Future<Output = AssistantResult<T>>,
    ) -> Result<T, RunError> {
        let remaining = self.policy.deadline.saturating_sub(started.elapsed());
        match tokio::time::timeout(remaining, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!("Assistant API call still pending at the run deadline");
                Err(RunError::TimedOut {
                    attempts,
                    elapsed: started.elapsed(),
                })
            }
        }
    }

    /// One output per pending call, in request order. Failures become the
    /// output text so the run is never left waiting.
    async fn answer_tool_calls(&self, run: &Run) -> Vec<ToolOutput> {
        let calls = run.pending_tool_calls();
        let mut outputs = Vec::with_capacity(calls.len());
        for call in &calls {
            let output = match self.tools.execute(call).await {
                Ok(text) => text,
                Err(e) => {
                    match &e {
                        ToolError::UnknownTool(name) => error!("Unknown tool requested: {}", name),
                        other => warn!("Tool {} failed: {}", call.function_name, other),
                    }
                    format!("Error: {}", e)
                }
            };
            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }
        outputs
    }
}
