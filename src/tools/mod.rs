mod http;
pub mod news;
pub mod quote;
pub mod todo;
pub mod weather;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::core::config::ProvidersConfig;
use crate::core::llm::types::ToolCall;
use crate::core::memory::{StoreError, TaskStore};

use self::news::NewsProvider;
use self::quote::QuoteProvider;
use self::weather::WeatherProvider;

pub const NO_QUOTE: &str = "No quote available right now.";
pub const NO_NEWS: &str = "No news articles found.";
pub const NO_WEATHER: &str = "No weather data found.";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} provider unavailable (HTTP {status})")]
    Unavailable { provider: &'static str, status: u16 },
    #[error("{provider} provider request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} provider sent an unreadable response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: &'static str, message: String },
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("task storage failed: {0}")]
    Storage(#[from] StoreError),
}

fn default_country() -> String {
    "us".to_string()
}

fn default_category() -> String {
    "general".to_string()
}

fn default_aqi() -> String {
    "no".to_string()
}

/// Accept `7` as well as `"7"`; models send either.
fn task_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(id) => Ok(id),
        IntOrString::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeadlinesArgs {
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_category")]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherArgs {
    pub city: String,
    #[serde(default = "default_aqi")]
    pub aqi: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddTaskArgs {
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateTaskArgs {
    #[serde(deserialize_with = "task_id")]
    pub task_id: i64,
    pub new_status: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeleteTaskArgs {
    #[serde(deserialize_with = "task_id")]
    pub task_id: i64,
}

/// A tool call resolved to its handler and typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    RandomQuote,
    TopHeadlines(HeadlinesArgs),
    Weather(WeatherArgs),
    AddTask(AddTaskArgs),
    ListTasks,
    UpdateTaskStatus(UpdateTaskArgs),
    DeleteTask(DeleteTaskArgs),
    Unknown(String),
}

impl ToolRequest {
    pub const GET_RANDOM_QUOTE: &'static str = "get_random_quote";
    pub const GET_TOP_HEADLINES: &'static str = "get_top_headlines";
    pub const GET_WEATHER: &'static str = "get_weather";
    pub const ADD_TASK: &'static str = "add_task_to_db";
    pub const GET_TASKS: &'static str = "get_tasks_from_db";
    pub const UPDATE_TASK_STATUS: &'static str = "update_task_status_in_db";
    pub const DELETE_TASK: &'static str = "delete_task_from_db";

    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ToolError> {
        fn typed<T: serde::de::DeserializeOwned>(
            tool: &'static str,
            arguments: &Value,
        ) -> Result<T, ToolError> {
            serde_json::from_value(arguments.clone()).map_err(|e| ToolError::InvalidArguments {
                tool,
                message: e.to_string(),
            })
        }

        Ok(match name {
            Self::GET_RANDOM_QUOTE => ToolRequest::RandomQuote,
            Self::GET_TOP_HEADLINES => {
                ToolRequest::TopHeadlines(typed(Self::GET_TOP_HEADLINES, arguments)?)
            }
            Self::GET_WEATHER => ToolRequest::Weather(typed(Self::GET_WEATHER, arguments)?),
            Self::ADD_TASK => ToolRequest::AddTask(typed(Self::ADD_TASK, arguments)?),
            Self::GET_TASKS => ToolRequest::ListTasks,
            Self::UPDATE_TASK_STATUS => {
                ToolRequest::UpdateTaskStatus(typed(Self::UPDATE_TASK_STATUS, arguments)?)
            }
            Self::DELETE_TASK => ToolRequest::DeleteTask(typed(Self::DELETE_TASK, arguments)?),
            other => ToolRequest::Unknown(other.to_string()),
        })
    }
}

/// Function-tool schemas registered with the remote assistant.
pub fn tool_definitions() -> Vec<Value> {
    let function = |name: &str, description: &str, parameters: Value| {
        json!({
            "type": "function",
            "function": {
                "name": name,
                "description": description,
                "parameters": parameters
            }
        })
    };

    vec![
        function(
            ToolRequest::GET_RANDOM_QUOTE,
            "Fetches a random quote and author",
            json!({"type": "object", "properties": {}, "required": []}),
        ),
        function(
            ToolRequest::GET_TOP_HEADLINES,
            "Fetches the top news headlines for a given country and category.",
            json!({
                "type": "object",
                "properties": {
                    "country": {
                        "type": "string",
                        "description": "The 2-letter country code (ISO 3166-1) for which you want to get the news headlines. Default is 'us'",
                        "default": "us"
                    },
                    "category": {
                        "type": "string",
                        "description": "The category of news to fetch. Default is 'general'.",
                        "enum": ["general", "business", "entertainment", "health", "science", "sports", "technology"],
                        "default": "general"
                    }
                },
                "required": []
            }),
        ),
        function(
            ToolRequest::GET_WEATHER,
            "Fetches the current weather for a city",
            json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string", "description": "City name, e.g. 'Riga'"},
                    "aqi": {"type": "string", "enum": ["yes", "no"], "default": "no"}
                },
                "required": ["city"]
            }),
        ),
        function(
            ToolRequest::ADD_TASK,
            "Add a task to the to-do list",
            json!({
                "type": "object",
                "properties": {"task": {"type": "string", "description": "The task to add"}},
                "required": ["task"]
            }),
        ),
        function(
            ToolRequest::GET_TASKS,
            "Retrieve all tasks from the to-do list",
            json!({"type": "object", "properties": {}}),
        ),
        function(
            ToolRequest::UPDATE_TASK_STATUS,
            "Update the status of a task in the to-do list",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "integer", "description": "The ID of the task to update"},
                    "new_status": {"type": "string", "description": "The new status of the task (e.g., 'completed', 'pending')"}
                },
                "required": ["task_id", "new_status"]
            }),
        ),
        function(
            ToolRequest::DELETE_TASK,
            "Delete a task from the to-do list",
            json!({
                "type": "object",
                "properties": {"task_id": {"type": "integer", "description": "The ID of the task to delete"}},
                "required": ["task_id"]
            }),
        ),
    ]
}

/// The external data providers, sharing one HTTP client.
pub struct Providers {
    pub quote: QuoteProvider,
    pub news: NewsProvider,
    pub weather: WeatherProvider,
}

impl Providers {
    pub fn from_config(config: &ProvidersConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            quote: QuoteProvider::new(client.clone(), config.quote_base_url.clone()),
            news: NewsProvider::new(
                client.clone(),
                config.news_base_url.clone(),
                config.news_api_key.clone(),
            ),
            weather: WeatherProvider::new(
                client,
                config.weather_base_url.clone(),
                config.weather_api_key.clone(),
            ),
        })
    }
}

/// Runs one tool call and produces the text handed back to the run.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError>;
}

pub struct ToolDispatcher {
    providers: Arc<Providers>,
    tasks: TaskStore,
}

impl ToolDispatcher {
    pub fn new(providers: Arc<Providers>, tasks: TaskStore) -> Self {
        Self { providers, tasks }
    }

    pub async fn dispatch(&self, function_name: &str, arguments: &Value) -> Result<String, ToolError> {
        let request = ToolRequest::parse(function_name, arguments)?;
        self.run(request).await
    }

    pub async fn run(&self, request: ToolRequest) -> Result<String, ToolError> {
        match request {
            ToolRequest::RandomQuote => Ok(self
                .providers
                .quote
                .random()
                .await?
                .map(|q| q.to_string())
                .unwrap_or_else(|| NO_QUOTE.to_string())),
            ToolRequest::TopHeadlines(args) => Ok(self
                .providers
                .news
                .top_headlines(&args.country, &args.category)
                .await?
                .map(|h| h.render())
                .unwrap_or_else(|| NO_NEWS.to_string())),
            ToolRequest::Weather(args) => Ok(self
                .providers
                .weather
                .current(&args.city, args.aqi.eq_ignore_ascii_case("yes"))
                .await?
                .map(|w| w.to_string())
                .unwrap_or_else(|| NO_WEATHER.to_string())),
            ToolRequest::AddTask(args) => {
                let id = self.tasks.add(&args.task).await?;
                info!("Added task {}: {}", id, args.task);
                Ok(todo::added(&args.task, id))
            }
            ToolRequest::ListTasks => Ok(todo::render_task_list(&self.tasks.list().await?)),
            ToolRequest::UpdateTaskStatus(args) => {
                info!("Updating task {} status to {}", args.task_id, args.new_status);
                if self
                    .tasks
                    .update_status(args.task_id, &args.new_status)
                    .await?
                {
                    Ok(todo::status_updated(args.task_id, &args.new_status))
                } else {
                    Ok(todo::not_found(args.task_id))
                }
            }
            ToolRequest::DeleteTask(args) => {
                info!("Deleting task {}", args.task_id);
                if self.tasks.delete(args.task_id).await? {
                    Ok(todo::deleted(args.task_id))
                } else {
                    Ok(todo::not_found(args.task_id))
                }
            }
            ToolRequest::Unknown(name) => Err(ToolError::UnknownTool(name)),
        }
    }
}

#[async_trait]
impl ToolExecutor for ToolDispatcher {
    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        info!("Tool call {} -> {}", call.id, call.function_name);
        self.dispatch(&call.function_name, &call.arguments).await
    }
}

#[cfg(test)]
pub(crate) fn test_dispatcher(tasks: TaskStore) -> ToolDispatcher {
    // Providers point at a closed port; task tools never touch them.
    let config = ProvidersConfig {
        quote_base_url: "http://127.0.0.1:9/quote".into(),
        news_base_url: "http://127.0.0.1:9/news".into(),
        weather_base_url: "http://127.0.0.1:9/weather".into(),
        request_timeout_secs: 1,
        ..ProvidersConfig::default()
    };
    ToolDispatcher::new(
        Arc::new(Providers::from_config(&config).expect("build provider client")),
        tasks,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_mock;
    use axum::routing::get;
    use axum::{Json, Router};

    fn dispatcher() -> ToolDispatcher {
        test_dispatcher(TaskStore::in_memory().unwrap())
    }

    #[test]
    fn parse_applies_headline_defaults() {
        let req = ToolRequest::parse("get_top_headlines", &json!({})).unwrap();
        assert_eq!(
            req,
            ToolRequest::TopHeadlines(HeadlinesArgs {
                country: "us".into(),
                category: "general".into()
            })
        );
    }

    #[test]
    fn parse_accepts_string_task_ids() {
        let req =
            ToolRequest::parse("delete_task_from_db", &json!({"task_id": " 12 "})).unwrap();
        assert_eq!(req, ToolRequest::DeleteTask(DeleteTaskArgs { task_id: 12 }));
    }

    #[test]
    fn parse_rejects_missing_required_arguments() {
        let err = ToolRequest::parse("add_task_to_db", &json!({})).unwrap_err();
        assert!(matches!(
            err,
            ToolError::InvalidArguments {
                tool: "add_task_to_db",
                ..
            }
        ));
        let err = ToolRequest::parse("update_task_status_in_db", &json!("{broken")).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn every_definition_parses_back_to_a_known_tool() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 7);
        for def in defs {
            let name = def["function"]["name"].as_str().unwrap();
            let sample = match name {
                "get_weather" => json!({"city": "Riga"}),
                "add_task_to_db" => json!({"task": "x"}),
                "update_task_status_in_db" => json!({"task_id": 1, "new_status": "completed"}),
                "delete_task_from_db" => json!({"task_id": 1}),
                _ => json!({}),
            };
            let req = ToolRequest::parse(name, &sample).unwrap();
            assert!(!matches!(req, ToolRequest::Unknown(_)), "{} unresolved", name);
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let err = dispatcher()
            .dispatch("return_integer", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "return_integer"));
    }

    #[tokio::test]
    async fn added_task_is_listed_as_pending() {
        let d = dispatcher();
        let out = d
            .dispatch("add_task_to_db", &json!({"task": "buy milk"}))
            .await
            .unwrap();
        assert!(out.contains("buy milk"));
        let list = d.dispatch("get_tasks_from_db", &json!({})).await.unwrap();
        assert!(list.contains("buy milk - pending"), "{}", list);
    }

    #[tokio::test]
    async fn update_then_list_shows_completed() {
        let d = dispatcher();
        d.dispatch("add_task_to_db", &json!({"task": "buy milk"}))
            .await
            .unwrap();
        let list = d.dispatch("get_tasks_from_db", &json!({})).await.unwrap();
        let id: i64 = list
            .lines()
            .find(|l| l.contains("buy milk"))
            .and_then(|l| l.split(':').next())
            .and_then(|s| s.parse().ok())
            .unwrap();

        let out = d
            .dispatch(
                "update_task_status_in_db",
                &json!({"task_id": id, "new_status": "completed"}),
            )
            .await
            .unwrap();
        assert_eq!(out, format!("Task {} status updated to 'completed'.", id));
        let list = d.dispatch("get_tasks_from_db", &json!({})).await.unwrap();
        assert!(list.contains(&format!("{}: buy milk - completed", id)));
    }

    #[tokio::test]
    async fn delete_removes_task_from_listing() {
        let d = dispatcher();
        d.dispatch("add_task_to_db", &json!({"task": "keep"}))
            .await
            .unwrap();
        d.dispatch("add_task_to_db", &json!({"task": "drop"}))
            .await
            .unwrap();
        let out = d
            .dispatch("delete_task_from_db", &json!({"task_id": 2}))
            .await
            .unwrap();
        assert_eq!(out, "Task 2 deleted.");
        let list = d.dispatch("get_tasks_from_db", &json!({})).await.unwrap();
        assert!(!list.contains("2: drop"));
        assert!(list.contains("1: keep - pending"));
    }

    #[tokio::test]
    async fn missing_task_ids_are_reported_not_errors() {
        let d = dispatcher();
        let out = d
            .dispatch("delete_task_from_db", &json!({"task_id": 99}))
            .await
            .unwrap();
        assert_eq!(out, "Task 99 not found.");
        let list = d.dispatch("get_tasks_from_db", &json!({})).await.unwrap();
        assert_eq!(list, todo::EMPTY_LIST);
    }

    #[tokio::test]
    async fn provider_tools_render_provider_data() {
        let app = Router::new()
            .route(
                "/quote",
                get(|| async { Json(json!([{"q": "Less is more.", "a": "Mies"}])) }),
            )
            .route("/news", get(|| async { Json(json!({"articles": []})) }));
        let base = serve_mock(app).await;
        let config = ProvidersConfig {
            quote_base_url: format!("{}/quote", base),
            news_base_url: format!("{}/news", base),
            ..ProvidersConfig::default()
        };
        let d = ToolDispatcher::new(
            Arc::new(Providers::from_config(&config).unwrap()),
            TaskStore::in_memory().unwrap(),
        );
        assert_eq!(
            d.dispatch("get_random_quote", &json!({})).await.unwrap(),
            "Less is more. - Mies"
        );
        assert_eq!(
            d.dispatch("get_top_headlines", &json!({"country": "lv"}))
                .await
                .unwrap(),
            NO_NEWS
        );
    }
}
