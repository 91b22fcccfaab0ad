use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod console;
mod engine;
mod error;
mod format;
mod message;
mod model;
mod server;
mod store;
mod tools;

use config::AgentConfig;
use engine::TurnEngine;
use model::AzureOpenAiClient;
use store::SessionStore;
use tools::ToolRegistry;

#[derive(Debug, Parser)]
#[command(name = "switchboard")]
#[command(about = "Conversational web-search agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the HTTP chat API
    Serve {
        #[arg(long, default_value = "127.0.0.1:8000")]
        listen: String,
    },
    /// Interactive console chat
    Chat,
}

fn build_engine(config: &AgentConfig) -> Arc<TurnEngine> {
    let tools = ToolRegistry::with_default_tools(config);
    let model = Arc::new(AzureOpenAiClient::new(config, tools.definitions()));
    Arc::new(TurnEngine::new(
        model,
        tools,
        SessionStore::new(),
        config.max_tool_rounds,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    // credentials are validated before either front end starts
    let config = AgentConfig::from_env()?;
    let engine = build_engine(&config);

    match cli.command {
        Commands::Serve { listen } => {
            let addr: SocketAddr = listen.parse()?;
            server::serve(addr, server::AppState { engine }).await?;
        }
        Commands::Chat => {
            console::Console::new(engine).run().await?;
        }
    }
    Ok(())
}
