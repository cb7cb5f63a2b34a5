//! Capability Adapter.
//!
//! Wraps one remote tool as a locally invocable [`Tool`] with a runtime
//! argument validator built from its normalized schema.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Number, Value};

use agent_mesh_core::{
    traits::{Tool, ToolSession},
    types::{ToolDescriptor, ToolOutput},
    Error, Result,
};
use agent_mesh_governance::track_tool_call;

use crate::schema::{NormalizedSchema, ParamType, SchemaNormalizer};

/// Validates keyword arguments against a [`NormalizedSchema`].
#[derive(Debug, Clone)]
pub struct ArgumentValidator {
    schema: NormalizedSchema,
}

impl ArgumentValidator {
    pub fn new(schema: NormalizedSchema) -> Self {
        Self { schema }
    }

    /// Drop nulls and undeclared keys, check required keys and types.
    ///
    /// Untyped schemas only lose their nulls.
    pub fn validate(&self, args: Map<String, Value>) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        for (key, value) in args {
            if value.is_null() {
                continue;
            }
            if self.schema.is_untyped() {
                out.insert(key, value);
                continue;
            }
            let Some(spec) = self.schema.param(&key) else {
                tracing::debug!(tool = %self.schema.tool, arg = %key, "Dropping undeclared argument");
                continue;
            };
            let value = coerce(spec.ty, value).ok_or_else(|| {
                Error::invalid_arguments(format!(
                    "{}: '{}' must be of type {}",
                    self.schema.tool,
                    key,
                    spec.ty.json_type()
                ))
            })?;
            out.insert(key, value);
        }

        let missing: Vec<&str> = self
            .schema
            .required()
            .filter(|p| !out.contains_key(&p.name))
            .map(|p| p.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(Error::invalid_arguments(format!(
                "{}: missing required argument(s): {}",
                self.schema.tool,
                missing.join(", ")
            )));
        }
        Ok(out)
    }
}

/// Accept `value` as `ty`; numbers are lax in both directions.
fn coerce(ty: ParamType, value: Value) -> Option<Value> {
    match (ty, value) {
        (ParamType::Text, v @ Value::String(_)) => Some(v),
        (ParamType::Bool, v @ Value::Bool(_)) => Some(v),
        (ParamType::Sequence, v @ Value::Array(_)) => Some(v),
        (ParamType::Mapping, v @ Value::Object(_)) => Some(v),
        (ParamType::Float, v @ Value::Number(_)) => Some(v),
        (ParamType::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                return Some(Value::Number(n));
            }
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then(|| Value::Number(Number::from(f as i64)))
        }
        _ => None,
    }
}

/// A remote tool exposed through an open session.
pub struct Capability {
    name: String,
    description: String,
    schema: NormalizedSchema,
    validator: ArgumentValidator,
    session: Arc<dyn ToolSession>,
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish()
    }
}

impl Capability {
    pub fn build(
        session: Arc<dyn ToolSession>,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: NormalizedSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            validator: ArgumentValidator::new(schema.clone()),
            schema,
            session,
        }
    }

    /// Build from a discovered descriptor. An empty description becomes
    /// `Call MCP tool <name>`.
    pub fn from_descriptor(
        session: Arc<dyn ToolSession>,
        descriptor: &ToolDescriptor,
        normalizer: &SchemaNormalizer,
    ) -> Self {
        let description = if descriptor.description.trim().is_empty() {
            format!("Call MCP tool {}", descriptor.name)
        } else {
            descriptor.description.clone()
        };
        let schema = normalizer.normalize(&descriptor.name, descriptor.input_schema.as_ref());
        Self::build(session, descriptor.name.clone(), description, schema)
    }

    pub fn schema(&self) -> &NormalizedSchema {
        &self.schema
    }

    /// Validate, call the remote tool and render its result as text.
    ///
    /// A remote error result is returned as `Ok("Error: ...")`; only
    /// validation and transport failures are `Err`.
    pub async fn invoke(&self, args: Map<String, Value>) -> Result<String> {
        self.run(args).await.map(|(text, _)| text)
    }

    async fn run(&self, args: Map<String, Value>) -> Result<(String, bool)> {
        let args = self.validator.validate(args)?;
        tracing::debug!(tool = %self.name, args = %serde_json::Value::Object(args.clone()), "Calling remote tool");

        let result = match self.session.call_tool(&self.name, args).await {
            Ok(result) => result,
            Err(e) => {
                track_tool_call(&self.name, "failed");
                tracing::warn!(tool = %self.name, error = %e, "Remote tool call failed");
                return Err(e);
            }
        };

        let text = result.text_content();
        if result.is_error {
            track_tool_call(&self.name, "error");
            let detail = if text.trim().is_empty() {
                "tool reported a failure".to_string()
            } else {
                text
            };
            return Ok((format!("Error: {}", detail), false));
        }
        track_tool_call(&self.name, "ok");
        Ok((text, true))
    }
}

#[async_trait]
impl Tool for Capability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.schema.to_json_schema()
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput> {
        let args = match args {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(Error::invalid_arguments(format!(
                    "{}: arguments must be an object, got {}",
                    self.name, other
                )))
            }
        };
        let (text, ok) = self.run(args).await?;
        Ok(if ok { ToolOutput::text(text) } else { ToolOutput::error(text) })
    }
}

/// One capability per discovered tool; unnamed tools are skipped.
pub fn build_capabilities(
    session: Arc<dyn ToolSession>,
    tools: &[ToolDescriptor],
    normalizer: &SchemaNormalizer,
) -> Vec<Capability> {
    tools
        .iter()
        .filter(|t| !t.name.trim().is_empty())
        .map(|t| Capability::from_descriptor(session.clone(), t, normalizer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_mesh_core::mocks::MockToolSession;
    use agent_mesh_core::types::CallToolResult;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn echo(session: Arc<MockToolSession>) -> Capability {
        Capability::from_descriptor(session, &ToolDescriptor::new("echo", ""), &SchemaNormalizer::default())
    }

    #[tokio::test]
    async fn test_null_optional_is_stripped() {
        let session = Arc::new(MockToolSession::new(Vec::new()));
        let capability = echo(session.clone());

        capability.invoke(args(json!({"message": "hi", "repeat": null}))).await.unwrap();

        let calls = session.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "echo");
        assert_eq!(Value::Object(calls[0].1.clone()), json!({"message": "hi"}));
    }

    #[tokio::test]
    async fn test_default_description() {
        let capability = echo(Arc::new(MockToolSession::new(Vec::new())));
        assert_eq!(capability.description(), "Call MCP tool echo");
    }

    #[tokio::test]
    async fn test_remote_error_is_labelled() {
        let session = Arc::new(
            MockToolSession::new(Vec::new()).with_result("echo", CallToolResult::error("bad repeat")),
        );
        let capability = echo(session);
        let text = capability.invoke(args(json!({"message": "hi"}))).await.unwrap();
        assert_eq!(text, "Error: bad repeat");

        let output = capability.execute(json!({"message": "hi"})).await.unwrap();
        assert!(!output.success);
    }

    #[tokio::test]
    async fn test_empty_remote_error_is_still_labelled() {
        let session = Arc::new(MockToolSession::new(Vec::new()).with_result(
            "echo",
            CallToolResult {
                content: Vec::new(),
                is_error: true,
            },
        ));
        let text = echo(session).invoke(args(json!({"message": "hi"}))).await.unwrap();
        assert!(text.starts_with("Error: "));
        assert!(text.len() > "Error: ".len());
    }

    #[tokio::test]
    async fn test_missing_required_is_rejected_before_call() {
        let session = Arc::new(MockToolSession::new(Vec::new()));
        let err = echo(session.clone()).invoke(args(json!({"repeat": 2}))).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(ref m) if m.contains("message")));
        assert!(session.calls().is_empty());
    }

    #[test]
    fn test_numeric_laxness() {
        let schema = SchemaNormalizer::default().normalize("echo", None);
        let validator = ArgumentValidator::new(schema);
        let out = validator.validate(args(json!({"message": "x", "repeat": 3.0}))).unwrap();
        assert_eq!(out["repeat"], json!(3));
        assert!(validator.validate(args(json!({"message": "x", "repeat": 2.5}))).is_err());

        let add = ArgumentValidator::new(SchemaNormalizer::default().normalize("add", None));
        let out = add.validate(args(json!({"a": 3, "b": 5.5}))).unwrap();
        assert_eq!(out["a"], json!(3));
    }

    #[test]
    fn test_undeclared_dropped_untyped_passthrough() {
        let typed = ArgumentValidator::new(SchemaNormalizer::default().normalize("greet", None));
        let out = typed.validate(args(json!({"name": "Alice", "mood": "happy"}))).unwrap();
        assert_eq!(Value::Object(out), json!({"name": "Alice"}));

        let untyped = ArgumentValidator::new(NormalizedSchema::empty("free"));
        let out = untyped.validate(args(json!({"anything": [1, 2], "gone": null}))).unwrap();
        assert_eq!(Value::Object(out), json!({"anything": [1, 2]}));
    }

    #[test]
    fn test_build_skips_unnamed_tools() {
        let session: Arc<dyn ToolSession> = Arc::new(MockToolSession::new(Vec::new()));
        let tools = vec![ToolDescriptor::new("add", "Add"), ToolDescriptor::new("", "nameless")];
        let caps = build_capabilities(session, &tools, &SchemaNormalizer::default());
        assert_eq!(caps.len(), 1);
        assert_eq!(caps[0].name(), "add");
    }
}
