//! Tool Discovery: list the tools a server exposes under a scoped session.

use std::sync::Arc;

use agent_mesh_core::{traits::ToolConnector, types::ToolDescriptor, Result};

use crate::mcp_client::with_session;

/// Lists tools on one tool server.
#[derive(Clone)]
pub struct ToolDiscovery {
    connector: Arc<dyn ToolConnector>,
    server_url: String,
}

impl ToolDiscovery {
    pub fn new(connector: Arc<dyn ToolConnector>, server_url: impl Into<String>) -> Self {
        Self {
            connector,
            server_url: server_url.into(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn connector(&self) -> &Arc<dyn ToolConnector> {
        &self.connector
    }

    /// Open a session, list its tools and close it.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let tools = with_session(self.connector.as_ref(), &self.server_url, |session| async move {
            session.list_tools().await
        })
        .await?;
        tracing::debug!(url = %self.server_url, count = tools.len(), "Discovered tools");
        Ok(tools)
    }

    /// Like [`list_tools`](Self::list_tools), but an unreachable server means no tools.
    pub async fn list_tools_or_empty(&self) -> Vec<ToolDescriptor> {
        match self.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                tracing::warn!(url = %self.server_url, error = %e, "Tool discovery failed, assuming no tools");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_mesh_core::mocks::{MockToolConnector, MockToolSession};

    #[tokio::test]
    async fn test_lists_and_closes() {
        let session = Arc::new(MockToolSession::new(vec![
            ToolDescriptor::new("add", "Add numbers"),
            ToolDescriptor::new("greet", "Greet someone"),
        ]));
        let connector = Arc::new(MockToolConnector::new(session.clone()));
        let discovery = ToolDiscovery::new(connector.clone(), "http://mcp");

        let tools = discovery.list_tools().await.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(session.close_count(), 1);
        assert_eq!(connector.urls(), vec!["http://mcp".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_empty() {
        let discovery = ToolDiscovery::new(Arc::new(MockToolConnector::unreachable()), "http://down");
        assert!(discovery.list_tools().await.is_err());
        assert!(discovery.list_tools_or_empty().await.is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_still_closes() {
        let session = Arc::new(MockToolSession::unavailable());
        let discovery = ToolDiscovery::new(Arc::new(MockToolConnector::new(session.clone())), "http://mcp");
        assert!(discovery.list_tools_or_empty().await.is_empty());
        assert_eq!(session.close_count(), 1);
    }
}
