//! Planning layer for Agent Mesh.
//!
//! This crate provides the LLM response parser, the ReAct planner and the
//! tool-agent executor that runs it over MCP tools.

pub mod parser;
pub mod react;
pub mod tool_agent;

pub use parser::{ActionParser, ReActAction};
pub use react::{Planner, ReActConfig, ReActPlanner, NO_RESPONSE, TOOL_AGENT_SYSTEM_PROMPT};
pub use tool_agent::{tool_agent_card, ToolAgentExecutor, EMPTY_INPUT_MESSAGE, NO_TOOLS_MESSAGE, TOOL_AGENT_NAME};
