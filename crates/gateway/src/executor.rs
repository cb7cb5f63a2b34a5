//! Host executor: resolve each inbound request and forward it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use agent_mesh_core::{
    config::AppConfig,
    traits::{AgentExecutor, ClientFactory},
    types::{EventQueue, RequestContext, RoutingRequest},
    Error, Result,
};

use crate::connection::ConnectionCache;
use crate::forwarder::{ForwardOutcome, Forwarder};
use crate::registry::RegistrySnapshot;
use crate::routing_policy::Resolver;

/// Routes A2A requests to agents listed in the registry file.
///
/// The registry is re-read for every request so edits take effect without a
/// restart. Client handles are kept across requests.
pub struct HostExecutor {
    registry_path: PathBuf,
    resolver: Resolver,
    forwarder: Forwarder,
}

impl HostExecutor {
    pub fn new(registry_path: impl Into<PathBuf>, resolver: Resolver, forwarder: Forwarder) -> Self {
        Self {
            registry_path: registry_path.into(),
            resolver,
            forwarder,
        }
    }

    pub fn from_config(config: &AppConfig, factory: Arc<dyn ClientFactory>) -> Self {
        let cache = Arc::new(ConnectionCache::new(factory));
        Self::new(
            &config.registry.path,
            Resolver::from_config(&config.routing),
            Forwarder::from_config(cache, &config.routing),
        )
    }

    /// Resolve and forward one request.
    pub async fn route(&self, ctx: &RequestContext) -> ForwardOutcome {
        let snapshot = RegistrySnapshot::load(&self.registry_path).await;
        let request = RoutingRequest::from_metadata(ctx.metadata.as_ref(), ctx.user_input());
        let decision = self.resolver.resolve(&snapshot, &request);

        self.forwarder
            .forward(&decision, &ctx.message, ctx.metadata.clone(), &ctx.cancellation)
            .await
    }
}

#[async_trait]
impl AgentExecutor for HostExecutor {
    async fn execute(&self, ctx: RequestContext, events: &EventQueue) -> Result<()> {
        let outcome = self.route(&ctx).await;
        events.enqueue(outcome.into_event());
        Ok(())
    }

    async fn cancel(&self, _ctx: RequestContext, _events: &EventQueue) -> Result<()> {
        Err(Error::unsupported("Cancel not supported"))
    }
}
