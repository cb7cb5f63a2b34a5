//! Agent registry store.
//!
//! The registry is a static file listing downstream agents. It is re-read on
//! every load; a missing, unreadable or malformed file yields an empty
//! snapshot so callers always handle the "no agents" case explicitly.

use std::path::Path;

use serde::Deserialize;

use agent_mesh_core::types::AgentDescriptor;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Wrapped {
        #[serde(default)]
        agents: Vec<AgentDescriptor>,
    },
    Bare(Vec<AgentDescriptor>),
}

/// Immutable view of the registry at load time. Cheap to share across
/// concurrent resolutions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    agents: Vec<AgentDescriptor>,
}

impl RegistrySnapshot {
    pub fn new(agents: Vec<AgentDescriptor>) -> Self {
        Self { agents }
    }

    /// Load a snapshot from `path`. Never fails.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Agent registry unreadable, using empty registry");
                return Self::default();
            }
        };

        match Self::parse(path, &raw) {
            Ok(snapshot) => {
                tracing::debug!(
                    path = %path.display(),
                    agents = snapshot.agents.len(),
                    "Loaded agent registry"
                );
                snapshot
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Agent registry malformed, using empty registry");
                Self::default()
            }
        }
    }

    fn parse(path: &Path, raw: &str) -> anyhow::Result<Self> {
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let file: RegistryFile = if is_yaml {
            serde_yaml::from_str(raw)?
        } else {
            serde_json::from_str(raw)?
        };

        let agents = match file {
            RegistryFile::Wrapped { agents } | RegistryFile::Bare(agents) => agents,
        };
        Ok(Self { agents })
    }

    /// Enabled agents in registry order.
    pub fn list(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.iter().filter(|a| a.enabled)
    }

    /// Look up an enabled agent by id.
    pub fn by_id(&self, id: &str) -> Option<&AgentDescriptor> {
        self.list().find(|a| a.id == id)
    }

    /// Number of enabled agents.
    pub fn len(&self) -> usize {
        self.list().count()
    }

    pub fn is_empty(&self) -> bool {
        self.list().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let snapshot = RegistrySnapshot::load("/nonexistent/agent_registry.json").await;
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
    }

    #[tokio::test]
    async fn test_malformed_file_is_empty() {
        let file = write_temp(".json", "{ not json");
        assert!(RegistrySnapshot::load(file.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_agents_are_hidden() {
        let file = write_temp(
            ".json",
            r#"{"agents": [
                {"id": "portfolio", "url": "http://localhost:9001", "enabled": false},
                {"id": "validator", "url": "http://localhost:9002"}
            ]}"#,
        );
        let snapshot = RegistrySnapshot::load(file.path()).await;
        let ids: Vec<_> = snapshot.list().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["validator"]);
        assert!(snapshot.by_id("portfolio").is_none());
        assert!(snapshot.by_id("validator").is_some());
    }

    #[tokio::test]
    async fn test_yaml_registry() {
        let file = write_temp(
            ".yaml",
            "agents:\n  - id: a\n    url: http://a\n    skills:\n      - id: s\n        tags: [x]\n",
        );
        let snapshot = RegistrySnapshot::load(file.path()).await;
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.by_id("a").unwrap().has_skill_tag("x"));
    }
}
