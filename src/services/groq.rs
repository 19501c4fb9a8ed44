use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScriptConfig;
use crate::error::{Result, ReelsmithError};
use crate::segment::ScriptSegment;
use super::script::{build_script_prompt, build_translation_prompt, parse_script_response, NarrationLanguage};
use super::ScriptGenerator;

/// Script generator backed by an OpenAI-compatible chat completions API.
pub struct GroqScriptGenerator {
    client: reqwest::Client,
    config: ScriptConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

impl GroqScriptGenerator {
    pub fn new(config: ScriptConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    async fn complete(&self, messages: Vec<ChatMessage>, temperature: f32) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ReelsmithError::Generation("Groq API key missing".to_string()))?;

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReelsmithError::Generation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReelsmithError::Generation(format!(
                "Chat completion failed {}: {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReelsmithError::Generation(format!("Failed to read response: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| ReelsmithError::Generation("Chat completion returned no choices".to_string()))?;

        debug!("Raw chat completion: {}", content);
        Ok(content)
    }
}

#[async_trait]
impl ScriptGenerator for GroqScriptGenerator {
    async fn generate(
        &self,
        prompt: &str,
        segment_count: usize,
        language: NarrationLanguage,
    ) -> Result<Vec<ScriptSegment>> {
        let messages = vec![ChatMessage {
            role: "system",
            content: build_script_prompt(prompt, segment_count, language),
        }];

        let content = self.complete(messages, self.config.temperature).await?;
        parse_script_response(&content)
    }

    async fn translate(&self, segments: &[ScriptSegment], target_language: &str) -> Result<Vec<ScriptSegment>> {
        let messages = vec![
            ChatMessage {
                role: "system",
                content: build_translation_prompt(target_language),
            },
            ChatMessage {
                role: "user",
                content: serde_json::to_string(&serde_json::json!({ "segments": segments }))?,
            },
        ];

        let content = self.complete(messages, self.config.translation_temperature).await?;
        parse_script_response(&content)
    }
}
