use std::{fmt, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::LlmConfig;

#[derive(Debug, Error)]
#[error("model unavailable: {0}")]
pub struct ModelUnavailable(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    Short,
    #[default]
    Medium,
    #[serde(alias = "long")]
    Detailed,
}

impl SummaryMode {
    pub fn max_tokens(self) -> u32 {
        match self {
            SummaryMode::Short => 100,
            SummaryMode::Medium => 250,
            SummaryMode::Detailed => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SummaryMode::Short => "short",
            SummaryMode::Medium => "medium",
            SummaryMode::Detailed => "detailed",
        }
    }
}

impl fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, mode: SummaryMode) -> Result<String, ModelUnavailable>;

    async fn answer(&self, context: &str, question: &str) -> Result<String, ModelUnavailable>;
}

const TEMPERATURE: f32 = 0.3;
const ANSWER_MAX_TOKENS: u32 = 400;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ChatCompletionsSummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatCompletionsSummarizer {
    pub fn new(cfg: &LlmConfig, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("building LLM http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", cfg.base_url),
            model: cfg.model.clone(),
            api_key,
        })
    }

    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, ModelUnavailable> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "chat completion request failed");
                ModelUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, model = %self.model, "chat completion rejected");
            return Err(ModelUnavailable(format!("HTTP {status}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "chat completion body unreadable");
            ModelUnavailable(e.to_string())
        })?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ModelUnavailable("empty completion".into()))?;
        debug!(model = %self.model, chars = text.len(), "chat completion received");
        Ok(text)
    }
}

#[async_trait]
impl Summarizer for ChatCompletionsSummarizer {
    async fn summarize(&self, text: &str, mode: SummaryMode) -> Result<String, ModelUnavailable> {
        let prompt = format!("Please provide a {mode} summary of the following text:\n\n{text}");
        self.complete(
            "You are a helpful assistant that summarizes medical documents concisely.",
            &prompt,
            mode.max_tokens(),
        )
        .await
    }

    async fn answer(&self, context: &str, question: &str) -> Result<String, ModelUnavailable> {
        let prompt = format!(
            "Answer the question using only the document excerpts below. \
             If the excerpts do not contain the answer, say so.\n\n\
             Excerpts:\n{context}\n\nQuestion: {question}"
        );
        self.complete(
            "You are a helpful assistant answering questions about a medical document.",
            &prompt,
            ANSWER_MAX_TOKENS,
        )
        .await
    }
}

/// Used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _text: &str, _mode: SummaryMode) -> Result<String, ModelUnavailable> {
        Err(ModelUnavailable("no LLM API key configured".into()))
    }

    async fn answer(&self, _context: &str, _question: &str) -> Result<String, ModelUnavailable> {
        Err(ModelUnavailable("no LLM API key configured".into()))
    }
}

#[cfg(test)]
pub use fake::ScriptedSummarizer;

#[cfg(test)]
mod fake {
    use std::sync::Mutex;

    use super::*;

    /// Deterministic summarizer recording every prompt it was given.
    #[derive(Default)]
    pub struct ScriptedSummarizer {
        pub fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSummarizer {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Summarizer for ScriptedSummarizer {
        async fn summarize(
            &self,
            text: &str,
            mode: SummaryMode,
        ) -> Result<String, ModelUnavailable> {
            self.calls.lock().unwrap().push(text.to_string());
            if self.fail {
                return Err(ModelUnavailable("scripted failure".into()));
            }
            let head: String = text.chars().take(24).collect();
            Ok(format!("{mode}: {head}"))
        }

        async fn answer(&self, context: &str, question: &str) -> Result<String, ModelUnavailable> {
            self.calls.lock().unwrap().push(context.to_string());
            if self.fail {
                return Err(ModelUnavailable("scripted failure".into()));
            }
            Ok(format!("answer to `{question}`"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_budget_per_mode() {
        assert_eq!(SummaryMode::Short.max_tokens(), 100);
        assert_eq!(SummaryMode::default().max_tokens(), 250);
        assert_eq!(SummaryMode::Detailed.max_tokens(), 500);
        let long: SummaryMode = serde_json::from_str("\"long\"").unwrap();
        assert_eq!(long, SummaryMode::Detailed);
    }

    #[tokio::test]
    async fn disabled_summarizer_is_unavailable() {
        assert!(DisabledSummarizer
            .summarize("text", SummaryMode::Short)
            .await
            .is_err());
        assert!(DisabledSummarizer.answer("ctx", "why?").await.is_err());
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 100,
            temperature: TEMPERATURE,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 100);
    }
}
