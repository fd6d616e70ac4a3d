//! HTTP-backed `LlmClient` over the OpenAI chat API or an Ollama server.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use cloudwarden_core::config::{LlmConfig, LlmProvider};

use crate::llm::LlmClient;

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com";

enum Backend {
    OpenAi { api_key: SecretString, base_url: String },
    Ollama { base_url: String },
}

pub struct HttpLlmClient {
    client: Client,
    backend: Backend,
    model: String,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build http client")?;

        let backend = match config.provider {
            LlmProvider::OpenAi => Backend::OpenAi {
                api_key: config
                    .api_key
                    .clone()
                    .ok_or_else(|| anyhow!("openai provider requires an api key"))?,
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| OPENAI_DEFAULT_BASE_URL.to_string()),
            },
            LlmProvider::Ollama => Backend::Ollama {
                base_url: config
                    .base_url
                    .clone()
                    .ok_or_else(|| anyhow!("ollama provider requires a base url"))?,
            },
        };

        Ok(Self { client, backend, model: config.model.clone() })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete_openai(
        &self,
        api_key: &SecretString,
        base_url: &str,
        prompt: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage { role: "user".to_string(), content: prompt.to_string() }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", base_url.trim_end_matches('/')))
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .context("openai request failed")?;

        if !response.status().is_success() {
            bail!("openai returned error status: {}", response.status());
        }

        let body: ChatResponse =
            response.json().await.context("failed to decode openai response")?;
        let choice = body.choices.into_iter().next().context("openai response had no choices")?;
        debug!(
            event_name = "llm.completion_received",
            backend = "openai",
            length = choice.message.content.len(),
            "completion received"
        );
        Ok(choice.message.content)
    }

    async fn complete_ollama(&self, base_url: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", base_url.trim_end_matches('/')))
            .json(&request)
            .send()
            .await
            .context("ollama request failed")?;

        if !response.status().is_success() {
            bail!("ollama returned error status: {}", response.status());
        }

        let body: GenerateResponse =
            response.json().await.context("failed to decode ollama response")?;
        debug!(
            event_name = "llm.completion_received",
            backend = "ollama",
            length = body.response.len(),
            "completion received"
        );
        Ok(body.response)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match &self.backend {
            Backend::OpenAi { api_key, base_url } => {
                self.complete_openai(api_key, base_url, prompt).await
            }
            Backend::Ollama { base_url } => self.complete_ollama(base_url, prompt).await,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}
