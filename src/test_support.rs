use async_trait::async_trait;
use axum::Router;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::core::llm::types::{
    AssistantSpec, RequiredAction, Run, RunStatus, SubmitToolOutputs, ToolOutput, WireFunction,
    WireToolCall,
};
use crate::core::llm::{AssistantClient, AssistantError, AssistantResult};

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub async fn serve_mock(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

pub fn run(status: RunStatus) -> Run {
    Run {
        id: "run_1".into(),
        thread_id: "thread_1".into(),
        status,
        required_action: None,
        last_error: None,
    }
}

/// A `requires_action` run asking for `(call_id, function, arguments)`.
pub fn run_requiring(calls: &[(&str, &str, &str)]) -> Run {
    let tool_calls = calls
        .iter()
        .map(|(id, name, args)| WireToolCall {
            id: id.to_string(),
            function: WireFunction {
                name: name.to_string(),
                arguments: args.to_string(),
            },
        })
        .collect();
    Run {
        required_action: Some(RequiredAction {
            kind: "submit_tool_outputs".into(),
            submit_tool_outputs: SubmitToolOutputs { tool_calls },
        }),
        ..run(RunStatus::RequiresAction)
    }
}

/// In-memory assistant replaying a fixed sequence of run states.
///
/// `create_run` returns the first scripted state; every retrieve or submit
/// returns the next one, and the last state repeats once the script runs out.
pub struct ScriptedAssistant {
    script: Mutex<VecDeque<Run>>,
    last: Mutex<Option<Run>>,
    reply: Option<String>,
    fail_messages: bool,
    stall_polls: bool,
    pub threads_created: Mutex<u32>,
    pub user_messages: Mutex<Vec<(String, String)>>,
    pub submissions: Mutex<Vec<Vec<ToolOutput>>>,
    pub polls: Mutex<u32>,
}

impl ScriptedAssistant {
    pub fn new(script: Vec<Run>, reply: Option<&str>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            reply: reply.map(str::to_string),
            fail_messages: false,
            stall_polls: false,
            threads_created: Mutex::new(0),
            user_messages: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            polls: Mutex::new(0),
        }
    }

    /// An assistant that answers `reply` on the first poll.
    pub fn replying(reply: &str) -> Self {
        Self::new(vec![run(RunStatus::Completed)], Some(reply))
    }

    /// Rejects every message append with HTTP 500.
    pub fn unreachable() -> Self {
        Self {
            fail_messages: true,
            ..Self::new(vec![], None)
        }
    }

    /// `retrieve_run` never resolves, like a connection that hangs.
    pub fn stalling(script: Vec<Run>) -> Self {
        Self {
            stall_polls: true,
            ..Self::new(script, None)
        }
    }

    fn next(&self) -> Run {
        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(run) = script.pop_front() {
            *last = Some(run);
        }
        last.clone().unwrap_or_else(|| run(RunStatus::InProgress))
    }
}

#[async_trait]
impl AssistantClient for ScriptedAssistant {
    async fn create_assistant(&self, _spec: &AssistantSpec) -> AssistantResult<String> {
        Ok("asst_test".into())
    }

    async fn create_thread(&self) -> AssistantResult<String> {
        let mut count = self.threads_created.lock().unwrap();
        *count += 1;
        Ok(format!("thread_{}", *count))
    }

    async fn add_user_message(&self, thread_id: &str, content: &str) -> AssistantResult<()> {
        if self.fail_messages {
            return Err(AssistantError::Http {
                status: 500,
                body: "upstream down".into(),
            });
        }
        self.user_messages
            .lock()
            .unwrap()
            .push((thread_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn create_run(&self, _thread_id: &str, _assistant_id: &str) -> AssistantResult<Run> {
        Ok(self.next())
    }

    async fn retrieve_run(&self, _thread_id: &str, _run_id: &str) -> AssistantResult<Run> {
        *self.polls.lock().unwrap() += 1;
        if self.stall_polls {
            std::future::pending::<()>().await;
        }
        Ok(self.next())
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: &[ToolOutput],
    ) -> AssistantResult<Run> {
        self.submissions.lock().unwrap().push(outputs.to_vec());
        Ok(self.next())
    }

    async fn latest_message(&self, _thread_id: &str) -> AssistantResult<Option<String>> {
        Ok(self.reply.clone())
    }
}
