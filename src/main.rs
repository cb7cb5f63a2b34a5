//! Agent Mesh - A2A routing host, MCP tool agent and MCP connector CLI.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use agent_mesh_controller::{tool_agent_card, ReActConfig, ReActPlanner, ToolAgentExecutor};
use agent_mesh_core::{config::AppConfig, traits::ToolConnector};
use agent_mesh_gateway::{host_card, A2aServer, HostExecutor, HttpClientFactory, RegistrySnapshot};
use agent_mesh_model_gateway::RigLlmClient;
use agent_mesh_skills::{server_url_from_config, with_session, McpHttpConnector, ToolDiscovery};

#[derive(Parser)]
#[command(name = "agent-mesh", version, about = "A2A agent routing and MCP tool orchestration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the host agent that routes requests to registry agents.
    Host {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the agent that answers with MCP tools.
    ToolAgent {
        #[arg(long)]
        host: Option<String>,
        #[arg(long, env = "TOOL_AGENT_PORT", default_value_t = 8093)]
        port: u16,
        /// URL advertised in the agent card.
        #[arg(long, env = "MCP_AGENT_URL")]
        public_url: Option<String>,
    },
    /// Talk to the MCP server directly.
    Mcp {
        /// Server URL; defaults to MCP_SERVER_URL, then the MCP registry.
        #[arg(long)]
        url: Option<String>,
        #[command(subcommand)]
        action: McpAction,
    },
}

#[derive(Subcommand)]
enum McpAction {
    ListTools,
    ListResources,
    Call {
        name: String,
        /// Arguments as a JSON object.
        #[arg(default_value = "{}")]
        args: String,
    },
    ReadResource {
        uri: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;

    let service = match &cli.command {
        Command::Host { .. } => "agent-mesh-host",
        Command::ToolAgent { .. } => "agent-mesh-tool-agent",
        Command::Mcp { .. } => "agent-mesh-mcp",
    };
    agent_mesh_governance::configure_tracing(service, config.telemetry.json_logs)?;

    match cli.command {
        Command::Host { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_host(config).await
        }
        Command::ToolAgent { host, port, public_url } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            config.server.port = port;
            if public_url.is_some() {
                config.server.public_url = public_url;
            }
            run_tool_agent(config).await
        }
        Command::Mcp { url, action } => {
            if url.is_some() {
                config.mcp.server_url = url;
            }
            run_mcp(config, action).await
        }
    }
}

fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        trigger.cancel();
    });
    token
}

fn with_metrics(server: A2aServer, config: &AppConfig) -> anyhow::Result<A2aServer> {
    if !config.telemetry.metrics {
        return Ok(server);
    }
    Ok(server.with_metrics(agent_mesh_governance::setup_metrics_recorder()?))
}

async fn run_host(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), registry = %config.registry.path, "Starting host agent");

    let snapshot = RegistrySnapshot::load(&config.registry.path).await;
    let connector = Arc::new(McpHttpConnector::from_config(&config.mcp)?);
    let mcp_url = server_url_from_config(&config.mcp).await;
    let tools = ToolDiscovery::new(connector, mcp_url).list_tools_or_empty().await;

    let card = host_card(&snapshot, &tools, config.server.public_url())?;
    tracing::info!(agents = snapshot.len(), tools = tools.len(), skills = card.skills.len(), "Host card built");

    let factory = Arc::new(HttpClientFactory::new(config.routing.request_timeout()));
    let executor = Arc::new(HostExecutor::from_config(&config, factory));

    let server = A2aServer::new(config.server.clone(), executor, card)
        .with_registry(&config.registry.path)
        .with_shutdown(shutdown_on_ctrl_c());
    with_metrics(server, &config)?.run().await?;
    Ok(())
}

async fn run_tool_agent(config: AppConfig) -> anyhow::Result<()> {
    let mcp_url = server_url_from_config(&config.mcp).await;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), mcp_url = %mcp_url, "Starting tool agent");

    let connector = Arc::new(McpHttpConnector::from_config(&config.mcp)?);
    let llm = Arc::new(RigLlmClient::from_config(&config.llm)?);
    let planner = Arc::new(ReActPlanner::new(llm, ReActConfig::from(&config.llm)));
    let executor = Arc::new(ToolAgentExecutor::new(ToolDiscovery::new(connector, mcp_url), planner));

    let card = tool_agent_card(config.server.public_url());
    let server = A2aServer::new(config.server.clone(), executor, card).with_shutdown(shutdown_on_ctrl_c());
    with_metrics(server, &config)?.run().await?;
    Ok(())
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_mcp(config: AppConfig, action: McpAction) -> anyhow::Result<()> {
    // Validate before connecting.
    let call_args = match &action {
        McpAction::Call { args, .. } => match serde_json::from_str::<Value>(args) {
            Ok(Value::Object(map)) => Some(map),
            _ => {
                eprintln!("{}", json!({"error": "Invalid JSON arguments"}));
                std::process::exit(1);
            }
        },
        _ => None,
    };

    let url = server_url_from_config(&config.mcp).await;
    let connector = McpHttpConnector::new(Duration::from_secs(config.mcp.request_timeout_secs))?;
    let connector: &dyn ToolConnector = &connector;

    let output = with_session(connector, &url, |session| async move {
        Ok(match action {
            McpAction::ListTools => json!({ "tools": session.list_tools().await? }),
            McpAction::ListResources => json!({ "resources": session.list_resources().await? }),
            McpAction::Call { name, .. } => {
                let args = call_args.unwrap_or_else(Map::new);
                serde_json::to_value(session.call_tool(&name, args).await?)?
            }
            McpAction::ReadResource { uri } => {
                let result = session.read_resource(&uri).await?;
                json!({ "contents": result.get("contents").cloned().unwrap_or_else(|| json!([])), "uri": uri })
            }
        })
    })
    .await?;

    print_json(&output)
}
