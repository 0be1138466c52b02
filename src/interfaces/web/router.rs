use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware,
    middleware::Next,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers::messages;

fn build_localhost_cors(api_port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", api_port),
        format!("http://localhost:{}", api_port),
        // Expo web dev server
        "http://localhost:8081".to_string(),
        "http://127.0.0.1:8081".to_string(),
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_api_router(state: AppState) -> Router {
    let cors = build_localhost_cors(state.api_port);

    Router::new()
        .route("/send-message/", post(messages::send_message))
        .route("/conversation-history/", get(messages::conversation_history))
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .with_state(state)
}

async fn security_headers(req: Request<Body>, next: Next) -> axum::response::Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gateway::MessageGateway;
    use crate::core::llm::types::{LastError, RunStatus};
    use crate::core::memory::{HistoryStore, TaskStore};
    use crate::core::poller::{RetryPolicy, RunPoller};
    use crate::test_support::{ScriptedAssistant, run, run_requiring};
    use crate::tools::test_dispatcher;
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn state_with(assistant: ScriptedAssistant) -> AppState {
        let poller = RunPoller::new(
            Arc::new(assistant),
            Arc::new(test_dispatcher(TaskStore::in_memory().unwrap())),
            "asst_test".into(),
            RetryPolicy {
                poll_interval: Duration::from_millis(1),
                max_poll_interval: Duration::from_millis(2),
                backoff_factor: 2.0,
                max_attempts: 2,
                deadline: Duration::from_secs(5),
            },
        );
        AppState {
            gateway: Arc::new(MessageGateway::new(
                poller,
                HistoryStore::in_memory().unwrap(),
            )),
            api_port: 8000,
        }
    }

    async fn json_request(app: Router, method: Method, path: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body_bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes).unwrap_or(serde_json::json!({}));
        (status, json)
    }

    #[tokio::test]
    async fn send_message_opens_a_thread_and_history_returns_it() {
        let app = build_api_router(state_with(ScriptedAssistant::replying("Hi! How can I help?")));

        let (status, body) =
            json_request(app.clone(), Method::POST, "/send-message/?message=hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Hi! How can I help?");
        assert_eq!(body["message_received"], "hello");
        let thread_id = body["thread_id"].as_str().unwrap().to_string();
        assert_eq!(thread_id, "thread_1");

        let (status, body) = json_request(
            app,
            Method::GET,
            &format!("/conversation-history/?thread_id={}", thread_id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["thread_id"], "thread_1");
        let history = body["conversation_history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["sender"], "user");
        assert_eq!(history[0]["content"], "hello");
        assert_eq!(history[1]["sender"], "assistant");
    }

    #[tokio::test]
    async fn given_thread_id_is_reused() {
        let app = build_api_router(state_with(ScriptedAssistant::new(
            vec![
                run_requiring(&[("call_1", "get_tasks_from_db", "{}")]),
                run(RunStatus::Completed),
            ],
            Some("Your list is empty."),
        )));
        let (status, body) = json_request(
            app,
            Method::POST,
            "/send-message/?thread_id=thread_abc&message=what%20is%20on%20my%20list",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["thread_id"], "thread_abc");
        assert_eq!(body["message_received"], "what is on my list");
    }

    #[tokio::test]
    async fn missing_message_is_bad_request() {
        let app = build_api_router(state_with(ScriptedAssistant::replying("unused")));
        let (status, body) = json_request(app, Method::POST, "/send-message/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "bad_request");
        assert_eq!(body["error"], "message is required");
    }

    #[tokio::test]
    async fn history_requires_thread_id() {
        let app = build_api_router(state_with(ScriptedAssistant::replying("unused")));
        let (status, _) = json_request(app, Method::GET, "/conversation-history/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failed_run_maps_to_bad_gateway() {
        let mut failed = run(RunStatus::Failed);
        failed.last_error = Some(LastError {
            code: None,
            message: Some("server_error".into()),
        });
        let app = build_api_router(state_with(ScriptedAssistant::new(vec![failed], None)));
        let (status, body) = json_request(
            app,
            Method::POST,
            "/send-message/?thread_id=thread_f&message=hi",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "run_failed");
    }

    #[tokio::test]
    async fn stuck_run_maps_to_gateway_timeout() {
        let app = build_api_router(state_with(ScriptedAssistant::new(
            vec![run(RunStatus::InProgress)],
            None,
        )));
        let (status, body) =
            json_request(app, Method::POST, "/send-message/?thread_id=t&message=hi").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["kind"], "timeout");
    }

    #[tokio::test]
    async fn unreachable_assistant_maps_to_bad_gateway() {
        let app = build_api_router(state_with(ScriptedAssistant::unreachable()));
        let (status, body) =
            json_request(app, Method::POST, "/send-message/?thread_id=t&message=hi").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "remote");
    }

    #[tokio::test]
    async fn security_headers_present_on_responses() {
        let app = build_api_router(state_with(ScriptedAssistant::replying("unused")));
        let req = Request::builder()
            .method(Method::GET)
            .uri("/conversation-history/?thread_id=none")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
    }
}
