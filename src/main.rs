//! Ticketflow - customer support ticket pipeline
//!
//! # Usage
//!
//! ```bash
//! # Serve the HTTP API (default command)
//! GROQ_API_KEY=... ticketflow serve --addr 0.0.0.0:8000
//!
//! # Process one ticket and print the result
//! ticketflow process --content "I can't log into my account"
//!
//! # Run the three sample tickets and print analytics
//! ticketflow demo
//!
//! # Validate configuration and environment
//! ticketflow check-config
//! ```
//!
//! # Environment Variables
//!
//! - `LLM_API_KEY` / `GROQ_API_KEY`: inference API key
//! - `LLM_ENDPOINT`, `LLM_MODEL`: inference endpoint and model
//! - `TICKETFLOW_CONFIG`: path to a TOML config file
//! - `TICKETFLOW_SERVER_ADDR`, `TICKETFLOW_CORS_ORIGINS`: HTTP overrides
//! - `RUST_LOG` / `LOG_LEVEL`: logging filter (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ticketflow::api::{create_app, new_ticket_id, ApiSettings};
use ticketflow::config::{AppConfig, LoggingConfig};
use ticketflow::Services;

/// Sample tickets processed by `ticketflow demo`
const DEMO_TICKETS: [&str; 3] = [
    "I can't log into my account",
    "I was charged twice this month",
    "How do I reset my password?",
];

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "ticketflow")]
#[command(about = "Multi-stage customer support ticket pipeline")]
#[command(version)]
struct CliArgs {
    /// Config file (overrides $TICKETFLOW_CONFIG and ./ticketflow.toml)
    #[arg(long, short, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Serve the HTTP API
    Serve {
        /// Bind address
        #[arg(long, value_name = "HOST:PORT")]
        addr: Option<String>,
    },
    /// Process a single ticket and print the result as JSON
    Process {
        /// Ticket text
        #[arg(long)]
        content: String,
        /// Ticket id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Process the sample tickets and print the analytics summary
    Demo,
    /// Load and validate configuration, then report the environment
    CheckConfig,
}

// ============================================================================
// Startup
// ============================================================================

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            let mut config = AppConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => Ok(AppConfig::load()),
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn run_server(config: &AppConfig, addr: String, cancel_token: CancellationToken) -> Result<()> {
    let services = Services::from_config(config)?;
    let app = create_app(services.api_state(ApiSettings::from(&config.server)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP server listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await;

    match result {
        Ok(()) => {
            info!("[HttpServer] Graceful shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("[HttpServer] Server error: {}", e);
            Err(anyhow::anyhow!("HTTP server error: {}", e))
        }
    }
}

async fn run_process(config: &AppConfig, content: &str, id: Option<String>) -> Result<()> {
    let services = Services::from_config(config)?;
    let ticket_id = id.unwrap_or_else(new_ticket_id);

    let state = services.orchestrator.process(&ticket_id, content).await?;
    services.store.save(&state)?;

    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

async fn run_demo(config: &AppConfig) -> Result<()> {
    let services = Services::from_config(config)?;

    for content in DEMO_TICKETS {
        let ticket_id = new_ticket_id();
        println!("\n{ticket_id}: {content}");
        match services.orchestrator.process(&ticket_id, content).await {
            Ok(state) => {
                let outcome = state.outcome()?;
                services.store.save(&state)?;
                println!("  category:   {} / {}", outcome.category, outcome.priority);
                println!("  confidence: {:.2}", outcome.confidence);
                println!("  escalated:  {} ({})", outcome.escalated, outcome.escalation_reason);
                println!("  response:   {}", outcome.response);
            }
            Err(e) => println!("  failed: {e}"),
        }
    }

    println!("\nAnalytics");
    println!("{}", serde_json::to_string_pretty(&services.metrics.summary())?);
    Ok(())
}

fn run_check_config(config: &AppConfig) -> Result<()> {
    config.validate()?;
    println!("Configuration OK");
    println!("  server:    {}", config.server.addr);
    println!("  endpoint:  {}", config.llm.endpoint);
    println!("  model:     {}", config.llm.model);
    println!("  storage:   {:?} ({})", config.storage.backend, config.storage.path.display());
    println!("  top_k:     {}", config.retrieval.top_k);
    if config.llm.api_key.is_some() {
        println!("  api key:   set");
        Ok(())
    } else {
        println!("  api key:   MISSING (set LLM_API_KEY or GROQ_API_KEY)");
        Err(anyhow::anyhow!("LLM API key is not configured"))
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = load_config(args.config.as_ref())?;
    init_tracing(&config.logging);

    match args.command.unwrap_or(SubCommand::Serve { addr: None }) {
        SubCommand::Serve { addr } => {
            config.validate()?;
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());

            // Graceful shutdown via Ctrl+C
            let cancel_token = CancellationToken::new();
            let shutdown_token = cancel_token.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Received Ctrl+C, initiating shutdown...");
                shutdown_token.cancel();
            });

            run_server(&config, addr, cancel_token).await
        }
        SubCommand::Process { content, id } => run_process(&config, &content, id).await,
        SubCommand::Demo => run_demo(&config).await,
        SubCommand::CheckConfig => run_check_config(&config),
    }
}
