//! Routing layer for Agent Mesh.
//!
//! This crate provides the agent registry, the resolver and its intent
//! classifier, the per-agent connection cache, the forwarder, the host
//! executor and the A2A HTTP server.

pub mod card;
pub mod client;
pub mod connection;
pub mod executor;
pub mod forwarder;
pub mod registry;
pub mod retry;
pub mod router;
pub mod routing_policy;
pub mod server;

pub use card::host_card;
pub use client::{A2aClient, HttpClientFactory};
pub use connection::ConnectionCache;
pub use executor::HostExecutor;
pub use forwarder::{build_outbound, ForwardOutcome, Forwarder, NO_AGENT_MESSAGE};
pub use registry::RegistrySnapshot;
pub use retry::RetryPolicy;
pub use router::KeywordIntentClassifier;
pub use routing_policy::{Resolution, ResolutionStrategy, Resolver};
pub use server::{A2aServer, AppState};
