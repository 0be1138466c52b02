use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Remote run states. Anything the service adds later lands in `Unknown`
/// and is polled like an in-flight run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// States the run cannot leave on its own other than `Completed`.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired | RunStatus::Incomplete
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LastError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub last_error: Option<LastError>,
}

impl Run {
    /// Tool calls the run is waiting on, decoded into owned structs.
    pub fn pending_tool_calls(&self) -> Vec<ToolCall> {
        self.required_action
            .as_ref()
            .map(|action| {
                action
                    .submit_tool_outputs
                    .tool_calls
                    .iter()
                    .map(ToolCall::from_wire)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn error_message(&self) -> String {
        self.last_error
            .as_ref()
            .and_then(|e| e.message.clone())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "No error message found...".to_string())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequiredAction {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub submit_tool_outputs: SubmitToolOutputs,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitToolOutputs {
    #[serde(default)]
    pub tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireToolCall {
    pub id: String,
    pub function: WireFunction,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireFunction {
    pub name: String,
    /// JSON-encoded argument object, as sent by the service.
    #[serde(default)]
    pub arguments: String,
}

/// A function call requested by the run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub function_name: String,
    pub arguments: Value,
}

impl ToolCall {
    fn from_wire(call: &WireToolCall) -> Self {
        let raw = call.function.arguments.trim();
        let arguments = if raw.is_empty() {
            Value::Object(Default::default())
        } else {
            // Unparseable arguments stay a string; the dispatcher rejects them.
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        };
        Self {
            id: call.id.clone(),
            function_name: call.function.name.clone(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Parameters for creating the remote assistant.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<Value>,
}
