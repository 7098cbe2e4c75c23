//! Learnlog - Personal Learning Knowledge Store
//!
//! Command-line entry point: serves the tool API, calls single tools and
//! runs a guided walkthrough against the configured backend.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use learnlog::{
    api::build_app,
    config::LearnlogConfig,
    diary::DiaryStore,
    knowledge::{KnowledgeSystem, ObservationBuilder, ResourceBuilder, ResourceType, TakeawayBuilder},
    tools::{KnowledgeTools, ToolsState},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "learnlog")]
#[command(version)]
#[command(about = "Personal learning knowledge store with a plain-text diary")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LEARNLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tool API over HTTP
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Call one tool and print its JSON response
    Call {
        /// Tool name, e.g. list_resources
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Walk through creating and linking a resource, observation and takeaway
    Demo,

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("learnlog={},tower_http=debug", log_level).into());
    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => LearnlogConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LearnlogConfig::default(),
    };
    config.apply_env();

    match cli.command {
        Commands::Serve { host, port } => {
            run_serve(config, host, port).await?;
        }
        Commands::Call { tool, args } => {
            run_call(config, &tool, &args).await?;
        }
        Commands::Demo => {
            run_demo(config).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

fn build_tools(config: &LearnlogConfig) -> Result<KnowledgeTools> {
    let system = KnowledgeSystem::connect(&config.backend)?;
    let diary = DiaryStore::new(config.diary.resolved_dir())?;
    Ok(KnowledgeTools::new(Arc::new(system), Arc::new(diary))
        .with_recent_default(config.diary.recent_default))
}

async fn run_serve(config: LearnlogConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.gateway.host.clone());
    let port = port.unwrap_or(config.gateway.port);

    let tools = build_tools(&config)?;
    let app = build_app(
        ToolsState {
            tools: Arc::new(tools),
        },
        &config.gateway.cors_origins,
    );

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!(%addr, "Learnlog tool API is running. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("Shutting down...");
    Ok(())
}

async fn run_call(config: LearnlogConfig, tool: &str, args: &str) -> Result<()> {
    let args: serde_json::Value =
        serde_json::from_str(args).context("--args must be a JSON value")?;

    let tools = build_tools(&config)?;
    let response = tools.call(tool, args).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        anyhow::bail!("tool {} failed", tool);
    }
    Ok(())
}

async fn run_demo(config: LearnlogConfig) -> Result<()> {
    let system = KnowledgeSystem::connect(&config.backend)?;

    println!("=== Learnlog walkthrough ===");
    println!();

    println!("1. Creating a learning resource...");
    let resource = system
        .resources
        .create(
            ResourceBuilder::new(ResourceType::Paper)
                .title("Attention Is All You Need")
                .source_url("https://arxiv.org/abs/1706.03762")
                .content_text(
                    "The dominant sequence transduction models are based on complex recurrent or convolutional neural networks...",
                )
                .tags(["transformers", "attention", "deep-learning"])
                .build()?,
        )
        .await?;
    println!("   Created resource: {}", resource.id);
    println!("   Title: {}", resource.title);
    println!();

    println!("2. Creating an observation...");
    let observation = system
        .observations
        .create(
            ObservationBuilder::new()
                .content("Multi-head attention shows 15% improvement over single head")
                .experiment_id("exp-001")
                .context("model", serde_json::json!("transformer-base"))
                .context("dataset", serde_json::json!("WMT2014"))
                .context("metric", serde_json::json!("BLEU"))
                .context("score", serde_json::json!(28.4))
                .build()?,
        )
        .await?;
    println!("   Created observation: {}", observation.id);
    println!("   Content: {}", observation.content);
    println!();

    println!("3. Creating a takeaway...");
    let takeaway = system
        .takeaways
        .create(
            TakeawayBuilder::new()
                .insight("Multi-head attention allows model to attend to different representation subspaces")
                .assumption_before("Single attention mechanism is sufficient for capturing dependencies")
                .assumption_after(
                    "Multiple attention heads capture different types of dependencies simultaneously",
                )
                .observation(observation.id.clone())
                .resource(resource.id.clone())
                .build()?,
        )
        .await?;
    println!("   Created takeaway: {}", takeaway.id);
    println!("   Insight: {}", takeaway.insight);
    println!();

    println!("4. Querying resources by tags...");
    let tagged = system
        .resources
        .get_by_tags(&["deep-learning".to_string()])
        .await?;
    println!("   Found {} deep learning resources", tagged.len());
    println!();

    println!("5. Getting observations for experiment...");
    let by_experiment = system.observations.get_by_experiment("exp-001").await?;
    println!("   Found {} observations for exp-001", by_experiment.len());
    println!();

    println!("6. Getting takeaway with relations...");
    match system.resolver.resolve(&takeaway.id).await? {
        Some(full) => {
            println!("   Insight: {}", full.takeaway.insight);
            println!("   Linked observations: {}", full.observations.len());
            println!("   Linked resources: {}", full.resources.len());
        }
        None => println!("   Takeaway {} disappeared before it could be read back", takeaway.id),
    }

    println!();
    println!("=== Walkthrough complete ===");
    Ok(())
}

fn show_config(config: Option<&LearnlogConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
