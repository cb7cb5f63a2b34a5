//! MCP session client against an in-process streamable-HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Map, Value};

use agent_mesh_core::traits::ToolConnector;
use agent_mesh_core::Error;
use agent_mesh_skills::{with_session, Capability, McpHttpConnector, SchemaNormalizer, ToolDiscovery};

const SESSION: &str = "session-42";

#[derive(Default)]
struct ServerState {
    deletes: AtomicUsize,
    missing_session: AtomicUsize,
    calls: Mutex<Vec<Value>>,
}

fn rpc_result(id: &Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn sse(payload: Value) -> Response {
    let body = format!(
        "event: message\ndata: {}\n\nevent: message\ndata: {}\n\n",
        json!({"jsonrpc": "2.0", "method": "notifications/message", "params": {"level": "info"}}),
        payload
    );
    ([("content-type", "text/event-stream")], body).into_response()
}

async fn handle(State(state): State<Arc<ServerState>>, headers: HeaderMap, Json(req): Json<Value>) -> Response {
    let method = req["method"].as_str().unwrap_or_default().to_string();
    let id = req.get("id").cloned().unwrap_or(Value::Null);

    if method == "initialize" {
        let body = rpc_result(&id, json!({"protocolVersion": "2024-11-05", "serverInfo": {"name": "fake"}}));
        return ([("Mcp-Session-Id", SESSION)], Json(body)).into_response();
    }
    if headers.get("mcp-session-id").and_then(|v| v.to_str().ok()) != Some(SESSION) {
        state.missing_session.fetch_add(1, Ordering::SeqCst);
    }

    match method.as_str() {
        "notifications/initialized" => StatusCode::ACCEPTED.into_response(),
        "tools/list" => match req["params"]["cursor"].as_str() {
            None => sse(rpc_result(
                &id,
                json!({
                    "tools": [
                        {"name": "add", "description": "Add two numbers",
                         "inputSchema": {"type": "object", "properties": {
                            "a": {"type": "number"}, "b": {"type": "number"}}, "required": ["a", "b"]}},
                        {"description": "nameless"}
                    ],
                    "nextCursor": "page-2"
                }),
            )),
            Some(_) => Json(rpc_result(&id, json!({"tools": [{"name": "greet"}]}))).into_response(),
        },
        "tools/call" => {
            state.calls.lock().unwrap().push(req["params"].clone());
            let name = req["params"]["name"].as_str().unwrap_or_default();
            let result = if name == "add" {
                let a = req["params"]["arguments"]["a"].as_f64().unwrap_or(0.0);
                let b = req["params"]["arguments"]["b"].as_f64().unwrap_or(0.0);
                json!({"content": [{"type": "text", "text": format!("{}", a + b)}], "isError": false})
            } else {
                json!({"content": [{"type": "text", "text": format!("unknown tool {name}")}], "isError": true})
            };
            Json(rpc_result(&id, result)).into_response()
        }
        "resources/list" => Json(rpc_result(
            &id,
            json!({"resources": [{"uri": "mem://notes", "name": "notes"}]}),
        ))
        .into_response(),
        "resources/read" => Json(rpc_result(
            &id,
            json!({"contents": [{"uri": req["params"]["uri"], "text": "hello"}]}),
        ))
        .into_response(),
        _ => Json(json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": "Method not found"}}))
            .into_response(),
    }
}

async fn terminate(State(state): State<Arc<ServerState>>) -> StatusCode {
    state.deletes.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn spawn_server() -> (String, Arc<ServerState>) {
    let state = Arc::new(ServerState::default());
    let app = Router::new()
        .route("/mcp", post(handle).delete(terminate))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/mcp", addr), state)
}

fn connector() -> Arc<McpHttpConnector> {
    Arc::new(McpHttpConnector::new(Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn test_discovery_follows_pages_and_closes() {
    let (url, state) = spawn_server().await;
    let discovery = ToolDiscovery::new(connector(), url);

    let tools = discovery.list_tools().await.unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["add", "greet"]);

    assert_eq!(state.deletes.load(Ordering::SeqCst), 1);
    assert_eq!(state.missing_session.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_capability_round_trip() {
    let (url, state) = spawn_server().await;
    let connector = connector();

    let text = with_session(connector.as_ref(), &url, |session| async move {
        let tools = session.list_tools().await?;
        let add = Capability::from_descriptor(session.clone(), &tools[0], &SchemaNormalizer::default());
        let mut args = Map::new();
        args.insert("a".into(), json!(3));
        args.insert("b".into(), json!(5));
        args.insert("note".into(), Value::Null);
        add.invoke(args).await
    })
    .await
    .unwrap();

    assert_eq!(text, "8");
    let calls = state.calls.lock().unwrap().clone();
    assert_eq!(calls[0]["arguments"], json!({"a": 3, "b": 5}));
}

#[tokio::test]
async fn test_remote_error_and_resources() {
    let (url, _state) = spawn_server().await;
    let session = connector().connect(&url).await.unwrap();

    let result = session.call_tool("nope", Map::new()).await.unwrap();
    assert!(result.is_error);
    assert_eq!(result.text_content(), "unknown tool nope");

    let resources = session.list_resources().await.unwrap();
    assert_eq!(resources[0].uri, "mem://notes");

    let contents = session.read_resource("mem://notes").await.unwrap();
    assert_eq!(contents["contents"][0]["text"], "hello");

    session.close().await.unwrap();
    session.close().await.unwrap();
    assert!(matches!(session.list_tools().await, Err(Error::Mcp(_))));
}

#[tokio::test]
async fn test_unreachable_server_yields_no_tools() {
    let discovery = ToolDiscovery::new(connector(), "http://127.0.0.1:1/mcp");
    assert!(discovery.list_tools_or_empty().await.is_empty());
}
