use ns_core::{Error, Result, SummaryModel};
use serde::{Deserialize, Serialize};
use std::fmt;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_COMPLETION_TOKENS: usize = 300;

pub struct OpenAiModel {
    client: reqwest::Client,
    api_key: String,
    model_name: String,
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OpenAiModel {
    pub fn new(api_key: String, model_name: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model_name: model_name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait::async_trait]
impl SummaryModel for OpenAiModel {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn summarize(&self, text: &str, max_length: usize) -> Result<String> {
        let request = ChatRequest {
            model: &self.model_name,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: format!(
                        "You are a professional news summarizer. Create concise, informative \
                         summaries of news articles. Keep summaries under {} words and focus \
                         on the key facts and main points.",
                        max_length
                    ),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Summarize this article: {}", text),
                },
            ],
            max_tokens: (max_length * 2).min(MAX_COMPLETION_TOKENS),
            temperature: 0.3,
        };

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ModelUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ModelUnavailable(format!(
                "model API returned {}",
                response.status()
            )));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::ModelUnavailable(format!("invalid response body: {}", e)))?;

        let summary = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if summary.is_empty() {
            return Err(Error::ModelUnavailable("empty completion".to_string()));
        }
        Ok(summary)
    }
}
