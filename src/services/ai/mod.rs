pub mod ollama;
pub mod openai;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String>;
}

/// System message first, then the transcript in order.
pub(crate) fn chat_messages(system_prompt: &str, messages: &[Message]) -> Vec<serde_json::Value> {
    std::iter::once(serde_json::json!({
        "role": "system",
        "content": system_prompt,
    }))
    .chain(messages.iter().map(|msg| {
        serde_json::json!({
            "role": msg.role,
            "content": msg.content,
        })
    }))
    .collect()
}

pub(crate) fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}
