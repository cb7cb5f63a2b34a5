//! A2A client and server over real sockets.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{routing::post, Router};
use serde_json::json;

use agent_mesh_core::config::ServerConfig;
use agent_mesh_core::traits::{AgentExecutor, AgentTransport};
use agent_mesh_core::types::{AgentCard, AgentEvent, EventQueue, Message, MessageSendParams, RequestContext};
use agent_mesh_core::{Error, Result};
use agent_mesh_gateway::{
    A2aClient, A2aServer, ConnectionCache, Forwarder, HostExecutor, HttpClientFactory, Resolver,
};

/// Replies `"echo: <input>"`, or fails when the input is `fail`.
struct EchoExecutor;

#[async_trait]
impl AgentExecutor for EchoExecutor {
    async fn execute(&self, ctx: RequestContext, events: &EventQueue) -> Result<()> {
        let input = ctx.user_input().unwrap_or_default();
        if input == "fail" {
            return Err(Error::internal("executor exploded"));
        }
        events.enqueue(AgentEvent::text(format!("echo: {}", input)));
        Ok(())
    }

    async fn cancel(&self, _ctx: RequestContext, _events: &EventQueue) -> Result<()> {
        Err(Error::unsupported("Cancel not supported"))
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/", addr)
}

async fn echo_agent() -> String {
    let server = A2aServer::new(
        ServerConfig::default(),
        Arc::new(EchoExecutor),
        AgentCard::new("Echo", "http://echo/"),
    );
    serve(server.build_router()).await
}

fn params(text: &str) -> MessageSendParams {
    MessageSendParams {
        message: Message::user_text(text),
        configuration: None,
        metadata: None,
    }
}

#[tokio::test]
async fn test_client_round_trip() {
    let url = echo_agent().await;
    let client = A2aClient::new(&url, Duration::from_secs(5)).unwrap();

    let result = client.send_message(params("hello")).await.unwrap();
    assert_eq!(result["kind"], "message");
    assert_eq!(result["parts"][0]["text"], "echo: hello");
}

#[tokio::test]
async fn test_jsonrpc_error_is_agent_error() {
    let url = echo_agent().await;
    let client = A2aClient::new(&url, Duration::from_secs(5)).unwrap();

    let err = client.send_message(params("fail")).await.unwrap_err();
    assert!(matches!(err, Error::Agent(ref m) if m.contains("executor exploded")));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_malformed_body_is_transport_error() {
    let url = serve(Router::new().route("/", post(|| async { "<html>oops</html>" }))).await;
    let client = A2aClient::new(&url, Duration::from_secs(5)).unwrap();

    let err = client.send_message(params("hi")).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_slow_agent_times_out() {
    let url = serve(Router::new().route(
        "/",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            axum::Json(json!({"jsonrpc": "2.0", "id": 1, "result": {}}))
        }),
    ))
    .await;
    let client = A2aClient::new(&url, Duration::from_millis(200)).unwrap();

    let err = client.send_message(params("hi")).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
}

#[tokio::test]
async fn test_host_relays_downstream_reply() {
    let echo_url = echo_agent().await;
    let registry = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    std::fs::write(
        registry.path(),
        json!({"agents": [{"id": "echo", "url": echo_url}]}).to_string(),
    )
    .unwrap();

    let cache = Arc::new(ConnectionCache::new(Arc::new(HttpClientFactory::new(Duration::from_secs(5)))));
    let executor = HostExecutor::new(registry.path(), Resolver::default(), Forwarder::new(cache.clone(), Duration::from_secs(5)));
    let host_url = serve(
        A2aServer::new(ServerConfig::default(), Arc::new(executor), AgentCard::new("Host", "http://host/"))
            .build_router(),
    )
    .await;

    let client = A2aClient::new(&host_url, Duration::from_secs(5)).unwrap();
    for _ in 0..2 {
        let result = client.send_message(params("through the host")).await.unwrap();
        assert_eq!(result["parts"][0]["text"], "echo: through the host");
    }
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port,
        public_url: None,
    };
    let server = A2aServer::new(config, Arc::new(EchoExecutor), AgentCard::new("Echo", "http://echo/"));
    let shutdown = server.shutdown_token();
    let handle = tokio::spawn(server.run());

    let health = format!("http://127.0.0.1:{}/health", port);
    let mut up = false;
    for _ in 0..50 {
        if reqwest::get(&health).await.is_ok_and(|r| r.status().is_success()) {
            up = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(up, "server did not come up");

    shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
}
