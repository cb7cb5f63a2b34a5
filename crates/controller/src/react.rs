//! ReAct loop implementation.
//!
//! ReAct (Reason + Act) drives the tool agent:
//! 1. Reason about the conversation so far
//! 2. Choose an action (tool call or answer)
//! 3. Execute the tool and observe the result
//! 4. Repeat until an answer or `max_iterations`

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use agent_mesh_core::{
    config::LlmConfig,
    traits::{ChatMessage, LlmClient},
    types::ToolDefinition,
    Error, Result,
};
use agent_mesh_skills::CapabilityRegistry;

use crate::parser::{is_thought, ActionParser, ReActAction};

pub const TOOL_AGENT_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to tools from an MCP server \
(add, greet, echo, etc.). Use the tools when they help answer the user. Reply concisely.";

pub const NO_RESPONSE: &str = "No response generated.";

const NUDGE: &str = "Please take an action using a tool, or provide your FINAL ANSWER.";

/// Turns user input into an answer, using tools as needed.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn run(&self, input: &str, tools: &CapabilityRegistry) -> Result<String>;
}

/// ReAct planner configuration.
#[derive(Debug, Clone)]
pub struct ReActConfig {
    /// Maximum LLM turns before giving up.
    pub max_iterations: usize,
    /// Preamble of the system prompt.
    pub system_prompt: String,
}

impl Default for ReActConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            system_prompt: TOOL_AGENT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl From<&LlmConfig> for ReActConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_iterations: config.max_iterations.max(1),
            ..Self::default()
        }
    }
}

pub struct ReActPlanner {
    llm: Arc<dyn LlmClient>,
    config: ReActConfig,
    parser: ActionParser,
}

impl ReActPlanner {
    pub fn new(llm: Arc<dyn LlmClient>, config: ReActConfig) -> Self {
        Self {
            llm,
            config,
            parser: ActionParser,
        }
    }

    pub fn system_prompt(&self, tools: &[ToolDefinition]) -> String {
        let listing: String = tools.iter().map(describe_tool).collect::<Vec<_>>().join("\n");
        format!(
            r#"{preamble}

AVAILABLE TOOLS:
{listing}

RESPONSE FORMAT:
Use exactly one of these formats in each response.

To call a tool:
ACTION: <tool_name>
ARGS: <json arguments>

To answer:
FINAL ANSWER: <your answer>"#,
            preamble = self.config.system_prompt,
        )
    }

    async fn observe(&self, tools: &CapabilityRegistry, name: &str, args: Value) -> String {
        match tools.execute(name, args).await {
            Ok(output) => output.content,
            Err(e) => format!("Error: {}", e),
        }
    }
}

/// `- add: Add two numbers (a: number, required; b: number, required)`
fn describe_tool(tool: &ToolDefinition) -> String {
    let required: Vec<&str> = tool.parameters["required"]
        .as_array()
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let params: Vec<String> = tool.parameters["properties"]
        .as_object()
        .into_iter()
        .flatten()
        .map(|(name, prop)| {
            let ty = prop["type"].as_str().unwrap_or("string");
            let flag = if required.contains(&name.as_str()) { "required" } else { "optional" };
            match prop["description"].as_str().filter(|d| *d != name) {
                Some(desc) => format!("{}: {}, {}, {}", name, ty, flag, desc),
                None => format!("{}: {}, {}", name, ty, flag),
            }
        })
        .collect();
    if params.is_empty() {
        format!("- {}: {}", tool.name, tool.description)
    } else {
        format!("- {}: {} ({})", tool.name, tool.description, params.join("; "))
    }
}

#[async_trait]
impl Planner for ReActPlanner {
    async fn run(&self, input: &str, tools: &CapabilityRegistry) -> Result<String> {
        let mut messages = vec![
            ChatMessage::system(self.system_prompt(&tools.list())),
            ChatMessage::user(input),
        ];

        for iteration in 1..=self.config.max_iterations {
            let response = self.llm.chat(&messages).await?;
            tracing::debug!(iteration, response_len = response.content.len(), "LLM response received");
            messages.push(ChatMessage::assistant(response.content.clone()));

            match self.parser.parse(&response.content) {
                ReActAction::FinalAnswer(answer) => return Ok(non_empty(answer)),
                ReActAction::ToolCall { name, args } => {
                    tracing::info!(iteration, tool = %name, "Executing tool call");
                    let observation = self.observe(tools, &name, args).await;
                    messages.push(ChatMessage::user(format!("OBSERVATION: {}", observation)));
                }
                ReActAction::Think(text) if is_thought(&text) => {
                    messages.push(ChatMessage::user(NUDGE));
                }
                // A reply with no action is the answer.
                ReActAction::Think(text) => return Ok(non_empty(text)),
            }
        }

        Err(Error::planner(format!(
            "no final answer after {} iterations",
            self.config.max_iterations
        )))
    }
}

fn non_empty(answer: String) -> String {
    if answer.trim().is_empty() {
        NO_RESPONSE.to_string()
    } else {
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_mesh_core::mocks::{MockLlm, MockToolSession};
    use agent_mesh_core::types::{CallToolResult, ToolDescriptor};
    use agent_mesh_skills::{build_capabilities, SchemaNormalizer};

    fn tools(session: Arc<MockToolSession>) -> CapabilityRegistry {
        let descriptors = vec![ToolDescriptor::new("add", "Add two numbers"), ToolDescriptor::new("greet", "")];
        CapabilityRegistry::from_tools(build_capabilities(session, &descriptors, &SchemaNormalizer::default()))
    }

    fn planner(llm: Arc<MockLlm>, max_iterations: usize) -> ReActPlanner {
        ReActPlanner::new(
            llm,
            ReActConfig {
                max_iterations,
                ..ReActConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_tool_then_answer() {
        let session = Arc::new(MockToolSession::new(Vec::new()).with_result("add", CallToolResult::text("8")));
        let llm = Arc::new(MockLlm::new(vec![
            "ACTION: add\nARGS: {\"a\": 3, \"b\": 5}".into(),
            "FINAL ANSWER: 3 + 5 = 8".into(),
        ]));

        let answer = planner(llm.clone(), 4).run("Add 3 and 5", &tools(session.clone())).await.unwrap();

        assert_eq!(answer, "3 + 5 = 8");
        assert_eq!(session.calls().len(), 1);
        let transcript = &llm.transcripts()[1];
        assert_eq!(transcript.last().unwrap().content, "OBSERVATION: 8");
        assert!(transcript[0].content.contains("a: number, required, First number"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_become_observation() {
        let session = Arc::new(MockToolSession::new(Vec::new()));
        let llm = Arc::new(MockLlm::new(vec![
            "ACTION: greet\nARGS: {}".into(),
            "FINAL ANSWER: I need a name.".into(),
        ]));

        let answer = planner(llm.clone(), 4).run("Greet", &tools(session.clone())).await.unwrap();

        assert_eq!(answer, "I need a name.");
        assert!(session.calls().is_empty());
        let transcripts = llm.transcripts();
        let observation = &transcripts[1].last().unwrap().content;
        assert!(observation.starts_with("OBSERVATION: Error:"));
    }

    #[tokio::test]
    async fn test_plain_reply_is_answer() {
        let llm = Arc::new(MockLlm::constant("Hi! How can I help?"));
        let session = Arc::new(MockToolSession::new(Vec::new()));
        let answer = planner(llm, 4).run("hello", &tools(session)).await.unwrap();
        assert_eq!(answer, "Hi! How can I help?");
    }

    #[tokio::test]
    async fn test_empty_answer() {
        let llm = Arc::new(MockLlm::constant("FINAL ANSWER:   "));
        let session = Arc::new(MockToolSession::new(Vec::new()));
        assert_eq!(planner(llm, 4).run("x", &tools(session)).await.unwrap(), NO_RESPONSE);
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let llm = Arc::new(MockLlm::constant("THOUGHT: still thinking"));
        let session = Arc::new(MockToolSession::new(Vec::new()));
        let result = planner(llm.clone(), 3).run("x", &tools(session)).await;
        assert!(matches!(result, Err(Error::Planner(_))));
        assert_eq!(llm.call_count(), 3);
    }
}
