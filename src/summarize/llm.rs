use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::config::{resolve_api_key, SummarizationConfig};
use crate::error::{DigestError, Result};
use crate::summarize::prompt;
use crate::summarize::{Summarizer, SummaryParams};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_completion_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct LlmClient {
    endpoint: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
    client: OnceLock<reqwest::blocking::Client>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl LlmClient {
    /// Create a new LLM client from the `[summarization]` section.
    /// The API key falls back to YTDIGEST_SUMMARIZER_KEY.
    pub fn from_config(config: &SummarizationConfig) -> anyhow::Result<Self> {
        let endpoint = if config.endpoint.is_empty() {
            anyhow::bail!(
                "Summarization endpoint not configured. \
                 Set [summarization] endpoint in ytdigest.toml"
            );
        } else {
            config.endpoint.trim_end_matches('/').to_string()
        };

        let api_key = resolve_api_key(&config.api_key, "YTDIGEST_SUMMARIZER_KEY").ok_or_else(
            || {
                anyhow::anyhow!(
                    "Summarization API key not configured. \
                     Set [summarization] api_key or YTDIGEST_SUMMARIZER_KEY"
                )
            },
        )?;

        let model = if config.model.is_empty() {
            anyhow::bail!(
                "Summarization model not configured. \
                 Set [summarization] model in ytdigest.toml"
            );
        } else {
            config.model.clone()
        };

        Ok(Self {
            endpoint,
            api_key,
            model,
            timeout_secs: config.timeout_secs,
            client: OnceLock::new(),
        })
    }

    fn client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let built = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()?;
        Ok(self.client.get_or_init(|| built))
    }

    /// Send a chat completion request and return the response text.
    pub fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            max_completion_tokens: max_tokens,
            temperature,
        };

        tracing::info!(
            "Sending chat completion request to {} ({})",
            self.endpoint,
            self.model
        );

        let response = self
            .client()?
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DigestError::Summarization(format!(
                "endpoint returned HTTP {}: {}",
                status.as_u16(),
                error_body
            )));
        }

        let chat_response: ChatResponse = response.json()?;

        if let Some(usage) = &chat_response.usage {
            tracing::info!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        let choice = chat_response.choices.first().ok_or_else(|| {
            DigestError::Summarization("no choices in chat completion response".to_string())
        })?;

        if let Some(reason) = &choice.finish_reason {
            if reason != "stop" {
                tracing::warn!("Chat completion finish_reason: {}", reason);
            }
        }

        let content = choice.message.content.trim();
        if content.is_empty() {
            return Err(DigestError::Summarization("empty completion".to_string()));
        }
        Ok(content.to_string())
    }
}

impl Summarizer for LlmClient {
    fn name(&self) -> &str {
        "llm"
    }

    fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String> {
        let (system, user) = prompt::build_prompt(text, params);
        let temperature = if params.sample { 0.7 } else { 0.0 };
        self.chat(&system, &user, prompt::token_budget(params.max_length), temperature)
    }
}
