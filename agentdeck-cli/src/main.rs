use agentdeck_gateway::GatewayError;
use agentdeck_http::{AppState, ConfigError, ServerConfigBuilder, router, shutdown_signal};
use agentdeck_tools::{ToolError, ToolRegistry};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "agentdeck", version)]
#[command(about = "AgentDeck - dashboard backend for managed AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address, overrides AGENTDECK_BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
        /// Disable simulated execution progress
        #[arg(long)]
        no_simulation: bool,
        /// Remote agent service endpoint, overrides AGENTDECK_REMOTE_ENDPOINT
        #[arg(long)]
        remote_endpoint: Option<String>,
    },
    /// List the tools in the registry
    Tools,
    /// Run one registry tool locally and print its output
    RunTool {
        /// Tool name
        name: String,
        /// JSON input for the tool
        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    // Initialize JSON logging once.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .try_init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            bind,
            no_simulation,
            remote_endpoint,
        } => serve(bind, no_simulation, remote_endpoint).await,
        Commands::Tools => {
            list_tools();
            Ok(())
        }
        Commands::RunTool { name, input } => run_tool(&name, &input).await,
        Commands::Config => print_config(),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn serve(
    bind: Option<String>,
    no_simulation: bool,
    remote_endpoint: Option<String>,
) -> Result<(), CliError> {
    let mut builder = ServerConfigBuilder::from_env()?;
    if let Some(bind) = bind {
        builder = builder.bind_addr(bind);
    }
    if no_simulation {
        builder = builder.simulation_enabled(false);
    }
    if let Some(endpoint) = remote_endpoint {
        builder = builder.remote_endpoint(endpoint);
    }
    let config = builder.build()?;
    let addr = config.bind_addr;

    let state = AppState::new(config)?;
    info!(
        remote_gateway = ?state.gateway.as_ref().map(|g| g.describe()),
        simulation_enabled = state.config.simulation_enabled,
        tools = state.tools.len(),
        "AgentDeck state initialized"
    );

    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "AgentDeck listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("AgentDeck stopped");
    Ok(())
}

fn list_tools() {
    let registry = ToolRegistry::with_standard_tools();
    for tool in registry.get_all_tools() {
        let required = tool.required_fields().join(", ");
        if required.is_empty() {
            println!("{:<14} {}", tool.name, tool.description);
        } else {
            println!("{:<14} {} (requires: {})", tool.name, tool.description, required);
        }
    }
}

async fn run_tool(name: &str, input: &str) -> Result<(), CliError> {
    let input: Value = serde_json::from_str(input)?;
    let output = ToolRegistry::with_standard_tools()
        .execute_tool(name, input, None)
        .await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// The API key is never serialized.
fn print_config() -> Result<(), CliError> {
    let config = ServerConfigBuilder::from_env()?.build()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
