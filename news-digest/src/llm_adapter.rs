use crate::types::{DigestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Trait for text-generation backends used to write the digest
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Get the name of this LLM adapter
    fn adapter_name(&self) -> String;

    /// Run one non-streaming completion and return the generated text
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            timeout_seconds: 300,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Adapter for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatibleAdapter {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiCompatibleAdapter {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// The non-streaming chat request for one batch, bearer credential included.
    pub fn build_request(&self, system_prompt: &str, user_prompt: &str) -> Result<reqwest::Request> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            stream: false,
        };

        Ok(self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .build()?)
    }

    /// Pulls the completion text out of a chat-completion response body.
    pub fn parse_completion(body: &str) -> Result<String> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| DigestError::Summarizer(format!("malformed response: {}", e)))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(DigestError::Summarizer("empty completion".to_string()));
        }
        Ok(content)
    }
}

#[async_trait]
impl LlmAdapter for OpenAiCompatibleAdapter {
    fn adapter_name(&self) -> String {
        format!("openai-compatible ({})", self.config.model)
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = self.build_request(system_prompt, user_prompt)?;

        debug!("Requesting completion from {} ({} prompt chars)", self.endpoint(), user_prompt.len());

        let response = self.http.execute(request).await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DigestError::Summarizer(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        Self::parse_completion(&body)
    }
}

/// Mock LLM adapter for development and testing.
///
/// Clones share the recorded calls, so a test can keep one handle while the
/// composer owns another.
#[derive(Clone)]
pub struct MockLlmAdapter {
    name: String,
    failing_calls: HashSet<usize>,
    /// `(system, user)` prompt pairs in call order.
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockLlmAdapter {
    pub fn new(name: String) -> Self {
        Self {
            name,
            failing_calls: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Makes the n-th call (1-based) fail.
    pub fn failing_on(mut self, call: usize) -> Self {
        self.failing_calls.insert(call);
        self
    }

    fn recorded(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// User prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.recorded().into_iter().map(|(_, user)| user).collect()
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.recorded().into_iter().map(|(system, _)| system).collect()
    }

    pub fn call_count(&self) -> usize {
        self.recorded().len()
    }
}

#[async_trait]
impl LlmAdapter for MockLlmAdapter {
    fn adapter_name(&self) -> String {
        format!("Mock LLM Adapter ({})", self.name)
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let call = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|_| DigestError::Summarizer("mock state poisoned".to_string()))?;
            calls.push((system_prompt.to_string(), user_prompt.to_string()));
            calls.len()
        };

        if self.failing_calls.contains(&call) {
            info!("Mock adapter {} failing call {}", self.name, call);
            return Err(DigestError::Summarizer(format!("mock failure on call {}", call)));
        }

        Ok(format!("{} summary for batch {}", self.name, call))
    }
}
