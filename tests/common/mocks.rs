//! Mock implementations for testing.
//!
//! [`ScriptedLLM`] plays every role the research engine asks of a model:
//! planning, relevance judgments, learning extraction, the search/evaluate
//! dialogue, and report writing. [`MockSearch`] serves canned results per
//! query.

use async_trait::async_trait;
use deep_research::llm::{ConversationMessage, LLMClient, LLMResponse, MessageRole, OutputSchema};
use deep_research::search::{SearchOptions, SearchProvider};
use deep_research::types::{AppError, Learning, Result, SearchResult, ToolCall, ToolDefinition};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

type Responder = Box<dyn Fn(&str, &str) -> Result<Value> + Send + Sync>;

/// Value of the first line in `text` starting with `prefix`
pub fn line_value<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.lines()
        .find_map(|line| line.strip_prefix(prefix))
        .map(str::trim)
}

/// Behaviour for [`ScriptedLLM::from_script`]
pub struct Script {
    /// Research prompt → planned queries
    pub plan: Box<dyn Fn(&str) -> Vec<String> + Send + Sync>,
    /// Candidate URL → relevance verdict
    pub relevant: Box<dyn Fn(&str) -> bool + Send + Sync>,
    /// Result URL → extracted learning
    pub learn: Box<dyn Fn(&str) -> Learning + Send + Sync>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            plan: Box::new(|_: &str| vec!["q1".to_string()]),
            relevant: Box::new(|_: &str| true),
            learn: Box::new(|url: &str| learning(&format!("learned from {}", url), &[])),
        }
    }
}

/// Build a learning
pub fn learning(text: &str, follow_ups: &[&str]) -> Learning {
    Learning {
        learning: text.to_string(),
        follow_up_questions: follow_ups.iter().map(|s| s.to_string()).collect(),
    }
}

/// Scripted LLM client that records every call it receives.
///
/// The tool dialogue is deterministic: the first turn searches for the
/// `Query:` line of the prompt, a search with results is followed by
/// `evaluate`, and anything else ends the dialogue.
pub struct ScriptedLLM {
    responder: Responder,
    report: Option<String>,
    structured_calls: Mutex<Vec<(String, String)>>,
    text_calls: Mutex<Vec<String>>,
    tool_turns: AtomicUsize,
}

impl ScriptedLLM {
    /// Create a client answering structured calls with `responder(schema_name, prompt)`
    pub fn new(responder: impl Fn(&str, &str) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            report: Some("# Report".to_string()),
            structured_calls: Mutex::new(Vec::new()),
            text_calls: Mutex::new(Vec::new()),
            tool_turns: AtomicUsize::new(0),
        }
    }

    /// Create a client from a [`Script`]
    pub fn from_script(script: Script) -> Self {
        Self::new(move |schema, prompt| match schema {
            "query_plan" => {
                let research_prompt = prompt
                    .split_once("\n\nPrompt: ")
                    .map(|(_, p)| p)
                    .unwrap_or(prompt);
                Ok(json!({ "queries": (script.plan)(research_prompt) }))
            }
            "relevance" => {
                let url = line_value(prompt, "URL: ").unwrap_or_default();
                Ok(json!({ "is_relevant": (script.relevant)(url) }))
            }
            "learning" => {
                let url = line_value(prompt, "URL: ").unwrap_or_default();
                let learning = (script.learn)(url);
                Ok(json!({
                    "learning": learning.learning,
                    "follow_up_questions": learning.follow_up_questions
                }))
            }
            other => Err(AppError::LLM(format!("unexpected schema {}", other))),
        })
    }

    /// Make report generation fail
    pub fn failing_report(mut self) -> Self {
        self.report = None;
        self
    }

    /// Prompts of the structured calls made with `schema`
    pub fn prompts_for(&self, schema: &str) -> Vec<String> {
        self.structured_calls
            .lock()
            .iter()
            .filter(|(name, _)| name == schema)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    pub fn calls_for(&self, schema: &str) -> usize {
        self.prompts_for(schema).len()
    }

    pub fn text_calls(&self) -> Vec<String> {
        self.text_calls.lock().clone()
    }

    pub fn tool_turns(&self) -> usize {
        self.tool_turns.load(Ordering::SeqCst)
    }

    fn next_tool_call(messages: &[ConversationMessage]) -> Option<ToolCall> {
        let query = messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .and_then(|m| line_value(&m.content, "Query: "))
            .unwrap_or_default()
            .to_string();

        let last = messages.last()?;
        match last.role {
            MessageRole::User => Some(ToolCall {
                id: "call_search".to_string(),
                name: "search".to_string(),
                arguments: json!({ "query": query }),
            }),
            MessageRole::Tool => {
                let result: Value = serde_json::from_str(&last.content).ok()?;
                let count = result.get("count").and_then(|c| c.as_u64())?;
                (count > 0).then(|| ToolCall {
                    id: "call_evaluate".to_string(),
                    name: "evaluate".to_string(),
                    arguments: json!({ "justification": format!("matches {}", query) }),
                })
            }
            _ => None,
        }
    }
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.text_calls.lock().push(prompt.to_string());
        self.report
            .clone()
            .ok_or_else(|| AppError::LLM("Mock LLM failure".to_string()))
    }

    async fn generate_structured(
        &self,
        _system: Option<&str>,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value> {
        self.structured_calls
            .lock()
            .push((schema.name.clone(), prompt.to_string()));
        (self.responder)(&schema.name, prompt)
    }

    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.tool_turns.fetch_add(1, Ordering::SeqCst);
        let tool_calls: Vec<ToolCall> = Self::next_tool_call(messages).into_iter().collect();
        let finish_reason = if tool_calls.is_empty() { "stop" } else { "tool_calls" };

        Ok(LLMResponse {
            content: String::new(),
            tool_calls,
            finish_reason: finish_reason.to_string(),
            usage: None,
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// In-memory search provider
#[derive(Default)]
pub struct MockSearch {
    results: HashMap<String, Vec<SearchResult>>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `urls` for `query`
    pub fn with(mut self, query: &str, urls: &[&str]) -> Self {
        self.results.insert(
            query.to_string(),
            urls.iter()
                .map(|url| SearchResult::new(format!("Title of {}", url), *url, format!("Content of {}", url)))
                .collect(),
        );
        self
    }

    /// Fail every search
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Queries searched so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str, _options: &SearchOptions) -> Result<Vec<SearchResult>> {
        self.queries.lock().push(query.to_string());
        if self.fail {
            return Err(AppError::Search("Mock search failure".to_string()));
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
