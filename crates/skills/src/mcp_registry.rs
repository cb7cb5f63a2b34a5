//! MCP server registry.
//!
//! A declarative description of where the tool server is deployed. Only
//! `remote` deployments are considered; the first valid one wins.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use agent_mesh_core::config::McpConfig;

/// Endpoint used when neither an override nor the registry names a server.
pub const DEFAULT_MCP_URL: &str = "http://localhost:8092/mcp";

/// File looked up when the registry path is a directory.
pub const REGISTRY_FILE_NAME: &str = "server.json";

/// One deployment of the tool server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub kind: String,
    pub url: Option<String>,
    pub transport: Option<String>,
}

impl Deployment {
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            kind: "remote".to_string(),
            url: Some(url.into()),
            transport: None,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.kind == "remote"
    }
}

/// Contents of `server.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpServerRegistry {
    pub name: Option<String>,
    pub description: Option<String>,
    pub deployments: Vec<Deployment>,
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

impl McpServerRegistry {
    /// Resolve a registry path: a directory means `<dir>/server.json`.
    pub async fn file_path(path: &Path) -> PathBuf {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => path.join(REGISTRY_FILE_NAME),
            _ => path.to_path_buf(),
        }
    }

    /// Load the registry. A missing or malformed file yields an empty registry.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let file = Self::file_path(path.as_ref()).await;
        let raw = match tokio::fs::read_to_string(&file).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(path = %file.display(), error = %e, "MCP registry not readable");
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "MCP registry malformed, ignoring");
                Self::default()
            }
        }
    }

    /// URL of the first remote deployment with a valid URL.
    pub fn first_remote_url(&self) -> Option<String> {
        self.deployments
            .iter()
            .filter(|d| d.is_remote())
            .filter_map(|d| d.url.as_deref())
            .map(trim_url)
            .find(|url| match url::Url::parse(url) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Skipping invalid MCP deployment URL");
                    false
                }
            })
    }
}

/// Resolve the tool-server URL: explicit override, then the registry's first
/// remote deployment, then [`DEFAULT_MCP_URL`].
pub async fn resolve_server_url(override_url: Option<&str>, registry_path: impl AsRef<Path>) -> String {
    if let Some(url) = override_url.map(trim_url).filter(|u| !u.is_empty()) {
        return url;
    }
    McpServerRegistry::load(registry_path)
        .await
        .first_remote_url()
        .unwrap_or_else(|| DEFAULT_MCP_URL.to_string())
}

/// [`resolve_server_url`] driven by configuration.
pub async fn server_url_from_config(config: &McpConfig) -> String {
    resolve_server_url(config.server_url.as_deref(), &config.registry_path).await
}
