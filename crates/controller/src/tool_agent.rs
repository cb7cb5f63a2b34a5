//! Tool agent: answers A2A requests with a planner over MCP tools.

use std::sync::Arc;

use async_trait::async_trait;

use agent_mesh_core::{
    traits::AgentExecutor,
    types::{AgentCard, AgentEvent, EventQueue, RequestContext, SkillDescriptor},
    Error, Result,
};
use agent_mesh_skills::{build_capabilities, with_session, CapabilityRegistry, SchemaNormalizer, ToolDiscovery};

use crate::react::Planner;

pub const TOOL_AGENT_NAME: &str = "MCP Tool Agent";
pub const EMPTY_INPUT_MESSAGE: &str = "Please provide a message.";
pub const NO_TOOLS_MESSAGE: &str =
    "No tools available from the MCP server. Ask the operator to start the MCP server or check mcp_registry.";

/// Card advertised by the tool agent.
pub fn tool_agent_card(url: impl Into<String>) -> AgentCard {
    AgentCard::new(TOOL_AGENT_NAME, url)
        .with_description("Planning agent that answers with tools from the MCP server (mcp_registry).")
        .with_skills(vec![SkillDescriptor::new("mcp_tools", "MCP tools")
            .with_description("Uses tools exposed by the MCP server such as add, greet and echo.")
            .with_tags(&["mcp", "tools", "assistant"])
            .with_examples(
                ["Add 3 and 5", "Greet Alice", "Echo hello world", "generate random number"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            )])
}

/// Discovers tools, wraps them as capabilities and runs the planner.
///
/// Each request uses its own MCP session, closed when the request ends.
pub struct ToolAgentExecutor {
    discovery: ToolDiscovery,
    normalizer: SchemaNormalizer,
    planner: Arc<dyn Planner>,
}

impl ToolAgentExecutor {
    pub fn new(discovery: ToolDiscovery, planner: Arc<dyn Planner>) -> Self {
        Self {
            discovery,
            normalizer: SchemaNormalizer::default(),
            planner,
        }
    }

    pub fn with_normalizer(mut self, normalizer: SchemaNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Produce the reply text for one input.
    pub async fn answer(&self, input: &str) -> String {
        let tools = self.discovery.list_tools_or_empty().await;
        if tools.is_empty() {
            return NO_TOOLS_MESSAGE.to_string();
        }

        let connector = self.discovery.connector().clone();
        let result = with_session(connector.as_ref(), self.discovery.server_url(), |session| async move {
            let registry = CapabilityRegistry::from_tools(build_capabilities(session, &tools, &self.normalizer));
            tracing::debug!(tools = registry.len(), "Running planner");
            self.planner.run(input, &registry).await
        })
        .await;

        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Tool agent failed");
            format!("Error: {}", e)
        })
    }
}

#[async_trait]
impl AgentExecutor for ToolAgentExecutor {
    async fn execute(&self, ctx: RequestContext, events: &EventQueue) -> Result<()> {
        let Some(input) = ctx.user_input() else {
            events.enqueue(AgentEvent::text(EMPTY_INPUT_MESSAGE));
            return Ok(());
        };

        let reply = tokio::select! {
            _ = ctx.cancellation.cancelled() => "Error: request cancelled".to_string(),
            reply = self.answer(&input) => reply,
        };
        events.enqueue(AgentEvent::text(reply));
        Ok(())
    }

    async fn cancel(&self, _ctx: RequestContext, _events: &EventQueue) -> Result<()> {
        Err(Error::unsupported("Cancel not supported"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::react::{ReActConfig, ReActPlanner};
    use agent_mesh_core::mocks::{MockLlm, MockToolConnector, MockToolSession};
    use agent_mesh_core::types::{Message, ToolDescriptor};

    fn executor(connector: MockToolConnector, llm: MockLlm) -> ToolAgentExecutor {
        let discovery = ToolDiscovery::new(Arc::new(connector), "http://mcp");
        let planner = ReActPlanner::new(Arc::new(llm), ReActConfig::default());
        ToolAgentExecutor::new(discovery, Arc::new(planner))
    }

    async fn reply(executor: &ToolAgentExecutor, text: &str) -> String {
        let (queue, mut rx) = EventQueue::channel();
        executor.execute(RequestContext::new(Message::user_text(text)), &queue).await.unwrap();
        drop(queue);
        let AgentEvent::Message(message) = rx.recv().await.unwrap() else {
            panic!("expected a message event");
        };
        assert!(rx.recv().await.is_none());
        message.text_content()
    }

    #[tokio::test]
    async fn test_empty_input() {
        let executor = executor(MockToolConnector::unreachable(), MockLlm::constant("unused"));
        assert_eq!(reply(&executor, "   ").await, EMPTY_INPUT_MESSAGE);
    }

    #[tokio::test]
    async fn test_no_tools() {
        let llm = MockLlm::constant("unused");
        let executor = executor(MockToolConnector::unreachable(), llm);
        assert_eq!(reply(&executor, "Add 3 and 5").await, NO_TOOLS_MESSAGE);
    }

    #[tokio::test]
    async fn test_runs_planner_and_closes_sessions() {
        let session = Arc::new(MockToolSession::new(vec![ToolDescriptor::new("echo", "Echo text")]));
        let llm = MockLlm::new(vec![
            "ACTION: echo\nARGS: {\"message\": \"hello world\", \"repeat\": null}".into(),
            "FINAL ANSWER: hello world".into(),
        ]);
        let executor = executor(MockToolConnector::new(session.clone()), llm);

        assert_eq!(reply(&executor, "Echo hello world").await, "hello world");
        assert_eq!(session.calls().len(), 1);
        assert_eq!(session.close_count(), 2);
    }

    #[tokio::test]
    async fn test_planner_failure_is_reported() {
        let session = Arc::new(MockToolSession::new(vec![ToolDescriptor::new("add", "")]));
        let executor = ToolAgentExecutor::new(
            ToolDiscovery::new(Arc::new(MockToolConnector::new(session)), "http://mcp"),
            Arc::new(ReActPlanner::new(
                Arc::new(MockLlm::constant("THOUGHT: hmm")),
                ReActConfig {
                    max_iterations: 2,
                    ..ReActConfig::default()
                },
            )),
        );
        assert!(reply(&executor, "Add").await.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_cancel_is_unsupported() {
        let executor = executor(MockToolConnector::unreachable(), MockLlm::constant("unused"));
        let (queue, _rx) = EventQueue::channel();
        let err = executor
            .cancel(RequestContext::new(Message::user_text("x")), &queue)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_card() {
        let card = tool_agent_card("http://localhost:8093/");
        assert_eq!(card.name, TOOL_AGENT_NAME);
        assert_eq!(card.skills[0].id, "mcp_tools");
        assert_eq!(card.skills[0].examples.len(), 4);
    }
}
