//! `ngon` — command-line front end for the food-advisory engine.

use chrono::Timelike;
use clap::{Parser, Subcommand};
use ngon_chat::{AppConfig, ChatOrchestrator, ChatRequest};
use ngon_core::City;
use ngon_llm::{GeminiBackend, StreamEvent};
use ngon_retrieval::{HashEmbedding, HybridRetriever, IndexManager, StoreRegistry};
use ngon_router::Router;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ngon", about = "Ngon — hỏi đáp ẩm thực Việt Nam")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "ngon.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question
    Ask {
        /// The question text
        message: String,
        /// City identifier (e.g. ha_noi)
        #[arg(long, default_value = "ha_noi")]
        city: String,
        /// Your location, for proximity-aware answers
        #[arg(long)]
        address: Option<String>,
        /// Clock hour override (0-23), defaults to the local time
        #[arg(long)]
        hour: Option<u32>,
        /// Print the answer incrementally as it is generated
        #[arg(long)]
        stream: bool,
    },
    /// What to eat right now
    Suggest {
        /// City identifier
        #[arg(long, default_value = "ha_noi")]
        city: String,
        /// Clock hour override (0-23)
        #[arg(long)]
        hour: Option<u32>,
    },
    /// Find places near an address
    Nearby {
        /// What to eat (e.g. "phở")
        food_type: String,
        /// Your location
        #[arg(long)]
        address: String,
        /// City identifier
        #[arg(long, default_value = "ha_noi")]
        city: String,
        /// Clock hour override (0-23)
        #[arg(long)]
        hour: Option<u32>,
    },
    /// Load every city's data up front and report what is missing
    Preload,
}

fn local_hour() -> u32 {
    chrono::Local::now().hour()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_toml_file(&cli.config)
        .map_err(|e| anyhow::anyhow!("cannot load '{}': {e}", cli.config.display()))?;

    let stores = Arc::new(StoreRegistry::new(&config.data_dir));
    let indexes = Arc::new(IndexManager::new(&config.data_dir));
    let retriever = Arc::new(HybridRetriever::new(
        Arc::clone(&stores),
        Arc::clone(&indexes),
        Arc::new(HashEmbedding::default()),
    ));
    let backend = Arc::new(GeminiBackend::new(config.genai.clone())?);
    let orchestrator = ChatOrchestrator::new(
        Router::with_config(config.router.clone()),
        retriever,
        backend,
    );

    match cli.command {
        Commands::Ask {
            message,
            city,
            address,
            hour,
            stream,
        } => {
            let request = ChatRequest {
                message,
                city,
                history: Vec::new(),
                user_address: address,
                hour: hour.unwrap_or_else(local_hour),
            };
            if stream {
                let (mut rx, handle) = orchestrator.answer_stream(&request).await?;
                let mut stdout = std::io::stdout();
                while let Some(event) = rx.recv().await {
                    match event {
                        StreamEvent::TextDelta { text } => {
                            write!(stdout, "{text}")?;
                            stdout.flush()?;
                        }
                        StreamEvent::Done => break,
                        StreamEvent::Error { message } => {
                            anyhow::bail!("stream failed: {message}");
                        }
                    }
                }
                writeln!(stdout)?;
                handle.await??;
            } else {
                let reply = orchestrator.answer(&request).await?;
                println!("{}", reply.text);
            }
        }
        Commands::Suggest { city, hour } => {
            let suggestion = orchestrator
                .suggest(&city, hour.unwrap_or_else(local_hour))
                .await?;
            println!("({})", suggestion.meal.label());
            println!("{}", suggestion.text);
        }
        Commands::Nearby {
            food_type,
            address,
            city,
            hour,
        } => {
            let reply = orchestrator
                .nearby(&food_type, &city, &address, hour.unwrap_or_else(local_hour))
                .await?;
            println!("{}", reply.text);
        }
        Commands::Preload => {
            let failed = indexes.preload_all().await;
            for city in City::ALL {
                if let Err(e) = stores.get(city).await {
                    println!("✗ {city}: {e}");
                } else if let Some((_, index_err)) =
                    failed.iter().find(|(failed_city, _)| *failed_city == city)
                {
                    println!("✗ {city}: {index_err}");
                } else {
                    println!("✓ {city}");
                }
            }
            let ready = City::ALL.len() - failed.len();
            info!(ready, total = City::ALL.len(), "preload finished");
            if ready == 0 {
                anyhow::bail!("no city data could be loaded from {}", config.data_dir.display());
            }
        }
    }

    Ok(())
}
