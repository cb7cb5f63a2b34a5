//! Axum-based A2A JSON-RPC server.
//!
//! One server type hosts any [`AgentExecutor`]; the host and the tool agent
//! differ only in executor and card.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use agent_mesh_core::{
    config::ServerConfig,
    traits::AgentExecutor,
    types::{
        jsonrpc, AgentCard, EventQueue, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
        Message, MessageSendParams, RequestContext,
    },
    Error, Result,
};

use crate::registry::RegistrySnapshot;

/// Shared application state.
pub struct AppState {
    pub executor: Arc<dyn AgentExecutor>,
    pub card: AgentCard,
    /// When set, `/v1/agents` lists the registry's enabled agents.
    pub registry_path: Option<PathBuf>,
    /// Root token; every request gets a child.
    pub shutdown: CancellationToken,
}

/// A2A server.
pub struct A2aServer {
    config: ServerConfig,
    state: AppState,
    metrics_handle: Option<PrometheusHandle>,
}

impl A2aServer {
    pub fn new(config: ServerConfig, executor: Arc<dyn AgentExecutor>, card: AgentCard) -> Self {
        Self {
            config,
            state: AppState {
                executor,
                card,
                registry_path: None,
                shutdown: CancellationToken::new(),
            },
            metrics_handle: None,
        }
    }

    /// Expose `/v1/agents` backed by this registry file.
    pub fn with_registry(mut self, path: impl Into<PathBuf>) -> Self {
        self.state.registry_path = Some(path.into());
        self
    }

    /// Set metrics handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Use `token` as the root cancellation token.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.state.shutdown = token;
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Build the Axum router.
    pub fn build_router(self) -> Router {
        let has_registry = self.state.registry_path.is_some();
        let mut router = Router::new()
            .route("/", post(jsonrpc_handler))
            .route("/.well-known/agent.json", get(card_handler))
            .route("/.well-known/agent-card.json", get(card_handler))
            .route("/health", get(health_handler));

        if has_registry {
            router = router.route("/v1/agents", get(agents_handler));
        }

        let mut router = router.with_state(Arc::new(self.state));

        if let Some(handle) = self.metrics_handle {
            router = router.route("/metrics", get(move || async move { handle.render() }));
        }

        router
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .layer(TraceLayer::new_for_http())
    }

    /// Run until the shutdown token is cancelled.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let shutdown = self.state.shutdown.clone();
        let card_name = self.state.card.name.clone();

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::transport(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!(addr = %addr, agent = %card_name, "A2A server starting");

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| Error::transport(format!("Server error: {}", e)))?;

        tracing::info!(agent = %card_name, "A2A server stopped");
        Ok(())
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn card_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.card.clone())
}

async fn agents_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(path) = state.registry_path.as_ref() else {
        return (StatusCode::NOT_FOUND, Json(json!({"agents": []})));
    };
    let snapshot = RegistrySnapshot::load(path).await;
    let cards: Vec<AgentCard> = snapshot.list().map(|a| a.to_card()).collect();
    (StatusCode::OK, Json(json!({ "agents": cards })))
}

async fn jsonrpc_handler(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return Json(JsonRpcResponse::failure(
                None,
                JsonRpcError::new(jsonrpc::PARSE_ERROR, format!("Parse error: {}", e)),
            ));
        }
    };

    tracing::debug!(method = %request.method, "JSON-RPC request");
    let id = request.id.clone();
    let response = match dispatch(&state, request).await {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => JsonRpcResponse::failure(id, error),
    };
    Json(response)
}

async fn dispatch(state: &AppState, request: JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
    match request.method.as_str() {
        "message/send" => {
            let params: MessageSendParams = request
                .params
                .ok_or_else(|| JsonRpcError::new(jsonrpc::INVALID_PARAMS, "Missing params"))
                .and_then(|p| {
                    serde_json::from_value(p)
                        .map_err(|e| JsonRpcError::new(jsonrpc::INVALID_PARAMS, format!("Invalid params: {}", e)))
                })?;
            send_message(state, params).await
        }
        "tasks/cancel" => {
            let task_id = request
                .params
                .as_ref()
                .and_then(|p| p.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let mut ctx = RequestContext::new(Message::user_text(""));
            ctx.task_id = task_id;
            let (queue, _rx) = EventQueue::channel();
            match state.executor.cancel(ctx, &queue).await {
                Ok(()) => Ok(json!({"status": "canceled"})),
                Err(e) => Err(to_rpc_error(e)),
            }
        }
        other => Err(JsonRpcError::new(
            jsonrpc::METHOD_NOT_FOUND,
            format!("Method not found: {}", other),
        )),
    }
}

async fn send_message(state: &AppState, params: MessageSendParams) -> std::result::Result<Value, JsonRpcError> {
    let token = state.shutdown.child_token();
    // Dropping the handler (client disconnect) cancels downstream work.
    let _guard = token.clone().drop_guard();

    let ctx = RequestContext::new(params.message)
        .with_metadata(params.metadata)
        .with_cancellation(token);

    let (queue, mut rx) = EventQueue::channel();
    state.executor.execute(ctx, &queue).await.map_err(to_rpc_error)?;
    drop(queue);

    match rx.recv().await {
        Some(event) => Ok(event.into_value()),
        None => Err(JsonRpcError::new(
            jsonrpc::INTERNAL_ERROR,
            "Executor produced no response",
        )),
    }
}

fn to_rpc_error(error: Error) -> JsonRpcError {
    let code = match &error {
        Error::Unsupported(_) => jsonrpc::UNSUPPORTED_OPERATION,
        Error::InvalidRequest(_) | Error::InvalidArguments(_) => jsonrpc::INVALID_PARAMS,
        _ => jsonrpc::INTERNAL_ERROR,
    };
    JsonRpcError::new(code, error.to_string())
}
