//! Typed structured output on top of [`LLMClient::generate_structured`].

use crate::llm::client::{LLMClient, OutputSchema};
use crate::types::{AppError, Result};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Generate a value of type `T`, using `T`'s JSON schema as the constraint.
pub async fn generate_object<T>(
    client: &dyn LLMClient,
    system: Option<&str>,
    prompt: &str,
    schema_name: &str,
) -> Result<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = OutputSchema::of::<T>(schema_name);
    let value = client.generate_structured(system, prompt, &schema).await?;

    serde_json::from_value(value).map_err(|e| {
        AppError::Schema(format!(
            "Response does not match schema '{}': {}",
            schema_name, e
        ))
    })
}

/// Parse model text as JSON, tolerating a surrounding markdown code fence.
pub(crate) fn parse_json_content(content: &str) -> Result<Value> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body)
        .map_err(|e| AppError::Schema(format!("Model output is not valid JSON: {}", e)))
}
