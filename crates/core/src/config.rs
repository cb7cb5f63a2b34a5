//! Layered application configuration.
//!
//! Sources, lowest precedence first: built-in defaults, `config/default.*`,
//! `config/local.*`, `AGENT_MESH__SECTION__KEY` variables, and finally the
//! well-known plain variables (`MCP_SERVER_URL`, `OPENAI_MODEL`, ...).

use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub routing: RoutingConfig,
    pub mcp: McpConfig,
    pub llm: LlmConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible URL advertised in the agent card.
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            public_url: None,
        }
    }
}

impl ServerConfig {
    /// URL advertised to callers, derived from host/port when not overridden.
    pub fn public_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegistryConfig {
    pub path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: "agent_registry.json".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RoutingConfig {
    /// Reserved id of the agent that fronts the tool server.
    pub tool_agent_id: String,
    /// Substrings that mark a message as a tool-using intent.
    pub tool_keywords: Vec<String>,
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            tool_agent_id: "mcp-tool-agent".into(),
            tool_keywords: ["greet", "add", "echo", "sum", "hello ", "random generator"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            request_timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

impl RoutingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per forwarded request; 1 disables retrying.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 200,
            max_jitter_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct McpConfig {
    /// Explicit tool-server URL; wins over the registry.
    pub server_url: Option<String>,
    /// File, or directory containing `server.json`.
    pub registry_path: String,
    pub request_timeout_secs: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            registry_path: "mcp_registry".into(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<Secret<String>>,
    pub temperature: f32,
    pub max_iterations: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            api_key: None,
            temperature: 0.0,
            max_iterations: 8,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TelemetryConfig {
    pub json_logs: bool,
    pub metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            metrics: true,
        }
    }
}

fn plain_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // AGENT_MESH__ROUTING__REQUEST_TIMEOUT_SECS=30 -> routing.request_timeout_secs
            .add_source(
                Environment::with_prefix("AGENT_MESH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("server.public_url", plain_env("HOST_URL"))?
            .set_override_option("registry.path", plain_env("AGENT_REGISTRY_PATH"))?
            .set_override_option("mcp.server_url", plain_env("MCP_SERVER_URL"))?
            .set_override_option("llm.model", plain_env("OPENAI_MODEL"))?
            .set_override_option("llm.api_key", plain_env("OPENAI_API_KEY"))?
            .build()?;

        s.try_deserialize()
    }
}
