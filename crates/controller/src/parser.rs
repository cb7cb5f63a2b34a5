//! Parser module for LLM response parsing.
//!
//! Extracts a structured action from raw LLM text. Three formats are
//! understood: `FINAL ANSWER:`, `ACTION:` + `ARGS:` lines, and a JSON
//! function call (optionally fenced).

use serde_json::{json, Value};

pub const FINAL_ANSWER_MARKER: &str = "FINAL ANSWER:";
const THOUGHT_MARKER: &str = "THOUGHT:";

/// Parsed action from an LLM response.
#[derive(Debug, Clone, PartialEq)]
pub enum ReActAction {
    /// Call a tool with arguments.
    ToolCall { name: String, args: Value },
    /// The task is complete.
    FinalAnswer(String),
    /// Reasoning with no action attached.
    Think(String),
}

/// Stateless response parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionParser;

impl ActionParser {
    pub fn parse(&self, response: &str) -> ReActAction {
        let response = response.trim();

        if let Some(idx) = response.find(FINAL_ANSWER_MARKER) {
            return ReActAction::FinalAnswer(response[idx + FINAL_ANSWER_MARKER.len()..].trim().to_string());
        }

        if let Some(action) = parse_text_format(response) {
            return action;
        }

        if let Some(action) = parse_function_call(strip_fence(response)) {
            return action;
        }

        ReActAction::Think(response.to_string())
    }
}

/// `ACTION: name` followed by `ARGS: {json}`. Missing or empty ARGS means `{}`.
fn parse_text_format(response: &str) -> Option<ReActAction> {
    let mut name = None;
    let mut args = None;
    for line in response.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("ACTION:") {
            name = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("ARGS:") {
            args = Some(rest.trim().to_string());
        }
    }

    let name = name.filter(|n| !n.is_empty())?;
    let args = match args.as_deref() {
        None | Some("") => json!({}),
        Some(raw) => serde_json::from_str(raw).ok()?,
    };
    Some(ReActAction::ToolCall { name, args })
}

fn strip_fence(response: &str) -> &str {
    response
        .strip_prefix("```json")
        .or_else(|| response.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(response)
}

/// OpenAI-style `{"function": {"name", "arguments": "<json>"}}`, or
/// `{"name", "arguments": {...}}`, or an array of either (first wins).
fn parse_function_call(response: &str) -> Option<ReActAction> {
    if !(response.starts_with('{') || response.starts_with('[')) {
        return None;
    }
    let value: Value = serde_json::from_str(response).ok()?;
    match &value {
        Value::Array(calls) => calls.first().and_then(extract_call),
        other => extract_call(other),
    }
}

fn extract_call(value: &Value) -> Option<ReActAction> {
    let call = value.get("function").unwrap_or(value);
    let name = call.get("name")?.as_str()?.to_string();
    let args = match call.get("arguments") {
        Some(Value::String(raw)) => serde_json::from_str(raw).ok()?,
        Some(args) => args.clone(),
        None => json!({}),
    };
    Some(ReActAction::ToolCall { name, args })
}

/// Whether free text is explicit reasoning rather than an answer.
pub fn is_thought(text: &str) -> bool {
    text.trim_start().starts_with(THOUGHT_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_final_answer() {
        let action = ActionParser.parse("THOUGHT: done.\nFINAL ANSWER: The result is 8.");
        assert_eq!(action, ReActAction::FinalAnswer("The result is 8.".into()));
    }

    #[test]
    fn test_parse_text_tool_call() {
        let action = ActionParser.parse("THOUGHT: I need to add.\nACTION: add\nARGS: {\"a\": 3, \"b\": 5}");
        match action {
            ReActAction::ToolCall { name, args } => {
                assert_eq!(name, "add");
                assert_eq!(args["b"], 5);
            }
            other => panic!("Expected ToolCall, got {:?}", other),
        }
    }

    #[test]
    fn test_action_without_args() {
        let action = ActionParser.parse("ACTION: just_fun_random");
        assert_eq!(
            action,
            ReActAction::ToolCall {
                name: "just_fun_random".into(),
                args: json!({})
            }
        );
    }

    #[test]
    fn test_parse_openai_function_call() {
        let action =
            ActionParser.parse(r#"[{"function": {"name": "greet", "arguments": "{\"name\": \"Alice\"}"}}]"#);
        match action {
            ReActAction::ToolCall { name, args } => {
                assert_eq!(name, "greet");
                assert_eq!(args["name"], "Alice");
            }
            other => panic!("Expected ToolCall, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_fenced_json() {
        let action = ActionParser.parse("```json\n{\"name\": \"echo\", \"arguments\": {\"message\": \"hi\"}}\n```");
        assert!(matches!(action, ReActAction::ToolCall { ref name, .. } if name == "echo"));
    }

    #[test]
    fn test_plain_text_is_think() {
        let action = ActionParser.parse("Hello there!");
        assert_eq!(action, ReActAction::Think("Hello there!".into()));
        assert!(!is_thought("Hello there!"));
        assert!(is_thought("THOUGHT: hmm"));
    }
}
