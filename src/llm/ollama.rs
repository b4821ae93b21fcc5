use crate::llm::client::{LLMClient, LLMResponse, OutputSchema, TokenUsage};
use crate::llm::coordinator::{ConversationMessage, MessageRole};
use crate::llm::structured::parse_json_content;
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Client for a local Ollama server's `/api/chat` endpoint
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    /// Non-streaming chat request
    async fn chat(&self, body: Value) -> Result<LLMResponse> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "Ollama request failed ({}): {}",
                status, text
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Failed to parse Ollama response: {}", e)))?;

        Self::parse_response(&response_json)
    }

    fn request_messages(messages: &[ConversationMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::System => json!({ "role": "system", "content": msg.content }),
                MessageRole::User => json!({ "role": "user", "content": msg.content }),
                MessageRole::Assistant if msg.tool_calls.is_empty() => {
                    json!({ "role": "assistant", "content": msg.content })
                }
                MessageRole::Assistant => {
                    let tool_calls: Vec<Value> = msg
                        .tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "function": {
                                    "name": tc.name,
                                    "arguments": tc.arguments
                                }
                            })
                        })
                        .collect();
                    json!({
                        "role": "assistant",
                        "content": msg.content,
                        "tool_calls": tool_calls
                    })
                }
                MessageRole::Tool => json!({ "role": "tool", "content": msg.content }),
            })
            .collect()
    }

    fn parse_response(json: &Value) -> Result<LLMResponse> {
        let message = json
            .get("message")
            .ok_or_else(|| AppError::LLM("No message in Ollama response".into()))?;

        let content = message
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let mut tool_calls = Vec::new();
        let mut finish_reason = "stop".to_string();

        if let Some(tc_array) = message.get("tool_calls").and_then(|v| v.as_array()) {
            for tc in tc_array {
                if let Some(func) = tc.get("function") {
                    let name = func
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string();
                    let arguments = func.get("arguments").cloned().unwrap_or(json!({}));

                    // Ollama does not assign call ids
                    tool_calls.push(ToolCall {
                        id: uuid::Uuid::new_v4().to_string(),
                        name,
                        arguments,
                    });
                }
            }
            if !tool_calls.is_empty() {
                finish_reason = "tool_calls".to_string();
            }
        }

        if let Some(reason) = json.get("done_reason").and_then(|v| v.as_str()) {
            if tool_calls.is_empty() {
                finish_reason = reason.to_string();
            }
        }

        let usage = match (
            json.get("prompt_eval_count").and_then(|v| v.as_u64()),
            json.get("eval_count").and_then(|v| v.as_u64()),
        ) {
            (None, None) => None,
            (prompt, completion) => Some(TokenUsage::new(
                prompt.unwrap_or(0) as u32,
                completion.unwrap_or(0) as u32,
            )),
        };

        Ok(LLMResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt }
            ],
            "stream": false
        });

        Ok(self.chat(body).await?.content)
    }

    async fn generate_structured(
        &self,
        system: Option<&str>,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value> {
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(json!({ "role": "system", "content": sys }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "format": schema.schema,
            "stream": false
        });

        let response = self.chat(body).await?;
        parse_json_content(&response.content)
    }

    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let tools: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters
                    }
                })
            })
            .collect();

        let body = json!({
            "model": self.model,
            "messages": Self::request_messages(messages),
            "tools": tools,
            "stream": false
        });

        self.chat(body).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
