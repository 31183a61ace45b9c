//! Workspace Flow server and CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workspace_flow::services::ServiceCatalog;
use workspace_flow::workflow::{execution_order, validate, WorkflowFile, WorkflowOrFile};
use workspace_flow::Config;

#[derive(Parser)]
#[command(name = "workspace-flow")]
#[command(about = "Workflow contract server for Google Workspace automation")]
struct Cli {
    /// Path to the YAML config file (default: ./config.yaml)
    #[arg(short, long, global = true, env = "WORKSPACE_FLOW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on (overrides config and SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate a workflow file (JSON or YAML) and print its execution order
    Validate {
        /// Workflow file path
        file: PathBuf,
    },

    /// Print the built-in service catalog as JSON
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,workspace_flow=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;
            if let Some(port) = port {
                config.server_port = port;
            }
            workspace_flow::start_server(config).await
        }
        Commands::Validate { file } => run_validate(&file),
        Commands::Catalog => {
            let catalog = ServiceCatalog::google_workspace();
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            Ok(())
        }
    }
}

fn run_validate(path: &std::path::Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file = WorkflowFile {
        id: String::new(),
        filename: path.display().to_string(),
        content,
        parsed: None,
        created_at: chrono::Utc::now(),
    };
    let workflow = WorkflowOrFile::File(file).normalize()?;

    let report = validate(&workflow);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.valid {
        anyhow::bail!("{} has {} error(s)", path.display(), report.errors.len());
    }

    for (i, level) in execution_order(&workflow)?.iter().enumerate() {
        println!("level {}: {}", i + 1, level.join(", "));
    }
    tracing::info!(workflow = %workflow.name, steps = workflow.steps.len(), "Workflow is valid");
    Ok(())
}
