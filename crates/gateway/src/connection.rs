//! Per-process cache of downstream agent clients.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use agent_mesh_core::{
    traits::{AgentTransport, ClientFactory},
    types::AgentDescriptor,
    Result,
};

type Slot = Arc<OnceCell<Arc<dyn AgentTransport>>>;

/// Maps agent id to a live client handle.
///
/// Each id owns a single initialisation slot, so concurrent first access
/// constructs exactly one client. Handles live until the cache is dropped.
pub struct ConnectionCache {
    factory: Arc<dyn ClientFactory>,
    clients: DashMap<String, Slot>,
}

impl ConnectionCache {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            clients: DashMap::new(),
        }
    }

    /// Return the client for `agent`, creating it on first use.
    pub async fn get(&self, agent: &AgentDescriptor) -> Result<Arc<dyn AgentTransport>> {
        // Clone the slot out so no shard lock is held across the await.
        let slot = self.clients.entry(agent.id.clone()).or_default().clone();

        let client = slot
            .get_or_try_init(|| async {
                tracing::info!(agent_id = %agent.id, url = %agent.url, "Creating agent client");
                self.factory.create(&agent.url)
            })
            .await?;
        Ok(client.clone())
    }

    /// Number of agents with an initialised client.
    pub fn len(&self) -> usize {
        self.clients.iter().filter(|e| e.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
