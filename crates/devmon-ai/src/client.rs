//! Chat-completion transport.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devmon_core::{
    HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient, RetryConfig, RetryingHttpClient,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AnalysisError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_COMPLETION_RETRIES: u32 = 3;

/// One system + user prompt exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Anything that turns a prompt into completion text.
///
/// `Ok(None)` means the API answered without any message content.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Option<String>, AnalysisError>;
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: String::from(DEFAULT_OPENAI_MODEL),
            base_url: String::from(DEFAULT_OPENAI_BASE_URL),
            timeout: DEFAULT_COMPLETION_TIMEOUT,
            max_retries: DEFAULT_COMPLETION_RETRIES,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// `None` when no API key is set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `DEVMON_OPENAI_API_KEY` (or `OPENAI_API_KEY`) and
    /// `DEVMON_OPENAI_MODEL` through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_key = get("DEVMON_OPENAI_API_KEY").or_else(|| get("OPENAI_API_KEY"))?;
        let mut config = Self::new(api_key);
        if let Some(model) = get("DEVMON_OPENAI_MODEL") {
            config = config.with_model(model);
        }
        Some(config)
    }
}

impl Debug for OpenAiConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat-completions client over the shared [`HttpClient`] seam.
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: Arc<dyn HttpClient>,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Client over reqwest with the configured retry budget.
    pub fn new(config: OpenAiConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// Wraps `http_client` in exponential retries of `config.max_retries`.
    pub fn with_http_client(config: OpenAiConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let retrying = RetryingHttpClient::new(http_client, RetryConfig::exponential(config.max_retries));
        Self {
            http_client: Arc::new(retrying),
            config,
        }
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Option<String>, AnalysisError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let body = serde_json::to_value(&body)
            .map_err(|error| AnalysisError::InvalidInput(error.to_string()))?;

        let timeout_ms = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
        let http_request = HttpRequest::post(format!("{}/chat/completions", self.config.base_url))
            .with_auth(&HttpAuth::BearerToken(self.config.api_key.clone()))
            .with_json_body(&body)
            .with_timeout_ms(timeout_ms);

        debug!(model = %self.config.model, max_tokens = request.max_tokens, "requesting completion");
        let response = self
            .http_client
            .execute(http_request)
            .await
            .map_err(|error| AnalysisError::Transport(error.to_string()))?;

        if !response.is_success() {
            return Err(AnalysisError::Status {
                status: response.status,
                message: response.body.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|error| AnalysisError::MalformedPayload(error.to_string()))?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devmon_core::{HttpError, HttpFuture, HttpResponse};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct ScriptedHttpClient {
        responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().expect("lock").clone()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
            self.requests.lock().expect("lock").push(request);
            let next = {
                let mut responses = self.responses.lock().expect("lock");
                if responses.is_empty() {
                    Ok(HttpResponse::new(500, "script exhausted"))
                } else {
                    responses.remove(0)
                }
            };
            Box::pin(async move { next })
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: String::from("system text"),
            prompt: String::from("user text"),
            temperature: 0.3,
            max_tokens: 500,
        }
    }

    fn config() -> OpenAiConfig {
        let mut config = OpenAiConfig::new("sk-test").with_base_url("https://llm.test/v1/");
        config.max_retries = 0;
        config
    }

    #[tokio::test]
    async fn posts_chat_completion_with_bearer_auth() {
        let http = ScriptedHttpClient::new(vec![Ok(HttpResponse::ok_json(
            r#"{"choices":[{"message":{"role":"assistant","content":"- Stable velocity"}}]}"#,
        ))]);
        let client = OpenAiClient::with_http_client(config(), http.clone());

        let content = client.complete(request()).await.expect("completes");

        assert_eq!(content.as_deref(), Some("- Stable velocity"));
        let sent = http.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://llm.test/v1/chat/completions");
        assert_eq!(
            sent[0].headers.get("authorization").map(String::as_str),
            Some("Bearer sk-test")
        );
        assert_eq!(sent[0].timeout_ms, 30_000);

        let body: serde_json::Value =
            serde_json::from_str(sent[0].body.as_deref().expect("body")).expect("json body");
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user text");
    }

    #[tokio::test]
    async fn missing_content_is_none() {
        let http = ScriptedHttpClient::new(vec![
            Ok(HttpResponse::ok_json(r#"{"choices":[]}"#)),
            Ok(HttpResponse::ok_json(r#"{"choices":[{"message":{"content":null}}]}"#)),
        ]);
        let client = OpenAiClient::with_http_client(config(), http);

        assert_eq!(client.complete(request()).await.expect("completes"), None);
        assert_eq!(client.complete(request()).await.expect("completes"), None);
    }

    #[tokio::test]
    async fn maps_status_and_transport_failures() {
        let http = ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(401, r#"{"error":"bad key"}"#)),
            Err(HttpError::connect("connection refused")),
            Ok(HttpResponse::ok_json("not json")),
        ]);
        let client = OpenAiClient::with_http_client(config(), http);

        assert!(matches!(
            client.complete(request()).await,
            Err(AnalysisError::Status { status: 401, .. })
        ));
        assert!(matches!(
            client.complete(request()).await,
            Err(AnalysisError::Transport(_))
        ));
        assert!(matches!(
            client.complete(request()).await,
            Err(AnalysisError::MalformedPayload(_))
        ));
    }

    #[test]
    fn config_reads_primary_then_fallback_key() {
        let env = HashMap::from([
            ("OPENAI_API_KEY", "sk-fallback"),
            ("DEVMON_OPENAI_MODEL", "gpt-4o-mini"),
        ]);
        let config = OpenAiConfig::from_lookup(|key| env.get(key).map(|value| (*value).to_owned()))
            .expect("configured");

        assert_eq!(config.api_key, "sk-fallback");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, DEFAULT_OPENAI_BASE_URL);
        assert!(!format!("{config:?}").contains("sk-fallback"));

        assert!(OpenAiConfig::from_lookup(|_| None).is_none());
        assert!(OpenAiConfig::from_lookup(|_| Some(String::from("  "))).is_none());
    }
}
