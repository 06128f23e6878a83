//! Generic OpenAI-compatible generator.
//! Most hosted LLM APIs accept the same `/chat/completions` request shape,
//! so one implementation covers OpenRouter, OpenAI, Groq, local gateways, etc.

use super::http_client::build_generator_client_with_timeout;
use super::scrub::{sanitize_api_error, scrub_secret_patterns};
use super::traits::Generator;
use super::types::ChatMessage;
use crate::config::GeneratorConfig;
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

pub struct OpenAiCompatibleGenerator {
    pub(crate) name: String,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    model: String,
    temperature: f64,
    /// Pre-computed chat completions URL (avoids `format!` per request).
    cached_chat_url: String,
    client: Client,
}

impl OpenAiCompatibleGenerator {
    pub fn new(
        name: &str,
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        temperature: f64,
        timeout_secs: u64,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let cached_chat_url = if base_url.contains("chat/completions") {
            base_url.clone()
        } else {
            format!("{base_url}/chat/completions")
        };

        Self {
            name: name.to_string(),
            base_url,
            api_key: api_key
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(ToString::to_string),
            model: model.to_string(),
            temperature,
            cached_chat_url,
            client: build_generator_client_with_timeout(timeout_secs),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(
            "openai-compatible",
            &config.base_url,
            config.api_key.as_deref(),
            &config.model,
            config.temperature,
            config.timeout_secs,
        )
    }

    fn chat_completions_url(&self) -> &str {
        &self.cached_chat_url
    }

    fn build_request(&self, system_prompt: &str, messages: &[ChatMessage]) -> ChatRequest {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(Message {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        });
        wire.extend(
            messages
                .iter()
                .filter(|msg| !msg.content.trim().is_empty())
                .map(|msg| Message {
                    role: msg.role.to_string(),
                    content: scrub_secret_patterns(&msg.content).into_owned(),
                }),
        );

        ChatRequest {
            model: self.model.clone(),
            messages: wire,
            temperature: self.temperature,
        }
    }

    async fn call_chat_completions(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let mut builder = self.client.post(self.chat_completions_url()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("{} chat completions request failed", self.name))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            anyhow::bail!(
                "{} API error ({status}): {}",
                self.name,
                sanitize_api_error(&body)
            );
        }

        response
            .json()
            .await
            .with_context(|| format!("{} chat completions JSON decode failed", self.name))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn extract_chat_text(response: &ChatResponse, generator_name: &str) -> anyhow::Result<String> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| anyhow::anyhow!("No response from {generator_name}"))
}

impl Generator for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate<'a>(
        &'a self,
        system_prompt: &'a str,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            if self.api_key.is_none() {
                anyhow::bail!(
                    "{} API key not set. Set generator.api_key or MENTORFLOW_API_KEY.",
                    self.name
                );
            }

            let request = self.build_request(system_prompt, messages);
            let response = self.call_chat_completions(&request).await?;
            extract_chat_text(&response, &self.name)
        })
    }
}
