use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

use crate::core::llm::types::{AssistantSpec, Run, ToolOutput};
use crate::core::llm::{AssistantClient, AssistantError, AssistantResult};

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<MessageText>,
}

#[derive(Deserialize)]
struct MessageText {
    value: String,
}

/// OpenAI Assistants v2 over plain HTTPS.
pub struct OpenAiAssistants {
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAiAssistants {
    pub fn new(
        api_key: String,
        base_url: String,
        request_timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder().timeout(request_timeout).build()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AssistantResult<T> {
        let res = request
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Err(AssistantError::Http {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }
        let body = res.text().await?;
        serde_json::from_str(&body).map_err(|e| AssistantError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AssistantClient for OpenAiAssistants {
    async fn create_assistant(&self, spec: &AssistantSpec) -> AssistantResult<String> {
        let created: IdOnly = self
            .send(self.client.post(self.url("assistants")).json(spec))
            .await?;
        Ok(created.id)
    }

    async fn create_thread(&self) -> AssistantResult<String> {
        let created: IdOnly = self
            .send(self.client.post(self.url("threads")).json(&json!({})))
            .await?;
        Ok(created.id)
    }

    async fn add_user_message(&self, thread_id: &str, content: &str) -> AssistantResult<()> {
        let _: IdOnly = self
            .send(
                self.client
                    .post(self.url(&format!("threads/{}/messages", thread_id)))
                    .json(&json!({ "role": "user", "content": content })),
            )
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> AssistantResult<Run> {
        self.send(
            self.client
                .post(self.url(&format!("threads/{}/runs", thread_id)))
                .json(&json!({ "assistant_id": assistant_id })),
        )
        .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> AssistantResult<Run> {
        self.send(
            self.client
                .get(self.url(&format!("threads/{}/runs/{}", thread_id, run_id))),
        )
        .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> AssistantResult<Run> {
        self.send(
            self.client
                .post(self.url(&format!(
                    "threads/{}/runs/{}/submit_tool_outputs",
                    thread_id, run_id
                )))
                .json(&json!({ "tool_outputs": outputs })),
        )
        .await
    }

    async fn latest_message(&self, thread_id: &str) -> AssistantResult<Option<String>> {
        let list: MessageList = self
            .send(
                self.client
                    .get(self.url(&format!("threads/{}/messages", thread_id)))
                    .query(&[("order", "desc"), ("limit", "1")]),
            )
            .await?;
        Ok(list.data.into_iter().next().and_then(|msg| {
            msg.content
                .into_iter()
                .find(|c| c.kind == "text")
                .and_then(|c| c.text)
                .map(|t| t.value)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_mock;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::Value;
    use std::collections::HashMap;

    #[tokio::test]
    async fn sends_beta_header_and_bearer_token() {
        let app = Router::new().route(
            "/threads",
            post(|headers: HeaderMap| async move {
                let beta = headers
                    .get("openai-beta")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if beta == "assistants=v2" && auth == "Bearer sk-test" {
                    (StatusCode::OK, Json(json!({"id": "thread_42"})))
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad headers"})))
                }
            }),
        );
        let base = serve_mock(app).await;
        let client =
            OpenAiAssistants::new("sk-test".into(), format!("{}/", base), Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.create_thread().await.unwrap(), "thread_42");
    }

    #[tokio::test]
    async fn latest_message_reads_newest_text_part() {
        let app = Router::new().route(
            "/threads/{thread}/messages",
            get(
                |Path(thread): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(thread, "thread_1");
                    assert_eq!(q.get("order").map(String::as_str), Some("desc"));
                    Json(json!({
                        "data": [{
                            "id": "msg_2",
                            "role": "assistant",
                            "content": [
                                {"type": "image_file", "image_file": {"file_id": "f"}},
                                {"type": "text", "text": {"value": "You have 2 tasks.", "annotations": []}}
                            ]
                        }]
                    }))
                },
            ),
        );
        let base = serve_mock(app).await;
        let client = OpenAiAssistants::new("k".into(), base, Duration::from_secs(5)).unwrap();
        let text = client.latest_message("thread_1").await.unwrap();
        assert_eq!(text.as_deref(), Some("You have 2 tasks."));
    }

    #[tokio::test]
    async fn non_success_status_maps_to_http_error() {
        let app = Router::new().route(
            "/threads/{thread}/runs",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let base = serve_mock(app).await;
        let client = OpenAiAssistants::new("k".into(), base, Duration::from_secs(5)).unwrap();
        match client.create_run("t", "asst").await {
            Err(AssistantError::Http { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected HTTP error, got {:?}", other.map(|r| r.id)),
        }
    }

    #[tokio::test]
    async fn submit_tool_outputs_posts_whole_batch() {
        let app = Router::new().route(
            "/threads/{thread}/runs/{run}/submit_tool_outputs",
            post(|Json(body): Json<Value>| async move {
                let count = body["tool_outputs"].as_array().map(Vec::len).unwrap_or(0);
                let status = if count == 2 { "queued" } else { "failed" };
                Json(json!({
                    "id": "run_1",
                    "thread_id": "thread_1",
                    "status": status
                }))
            }),
        );
        let base = serve_mock(app).await;
        let client = OpenAiAssistants::new("k".into(), base, Duration::from_secs(5)).unwrap();
        let outputs = vec![
            ToolOutput {
                tool_call_id: "a".into(),
                output: "one".into(),
            },
            ToolOutput {
                tool_call_id: "b".into(),
                output: "two".into(),
            },
        ];
        let run = client
            .submit_tool_outputs("thread_1", "run_1", &outputs)
            .await
            .unwrap();
        assert_eq!(run.status, crate::core::llm::types::RunStatus::Queued);
    }
}
