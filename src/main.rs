use anyhow::Result;
use clap::{Parser, Subcommand};
use docs_qa::commands::{ask, check, load_config, serve};
use docs_qa::config::{get_config_dir, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docs-qa")]
#[command(about = "Answer questions about a local knowledge file with a local language model")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml (defaults to ~/.docs-qa)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Index a knowledge file and serve the question form
    Serve {
        /// Plain-text knowledge file
        file: PathBuf,
        /// Address to bind, overrides the configured host
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides the configured port
        #[arg(long)]
        port: Option<u16>,
        /// Use local hashing embeddings instead of Ollama embeddings
        #[arg(long)]
        offline: bool,
    },
    /// Answer a single question and exit
    Ask {
        /// Plain-text knowledge file
        file: PathBuf,
        /// The question to answer
        question: String,
        /// Use local hashing embeddings instead of Ollama embeddings
        #[arg(long)]
        offline: bool,
        /// Print the segments the answer was based on
        #[arg(long)]
        show_sources: bool,
    },
    /// Check that Ollama is reachable and both models are available
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_dir = cli.config_dir.as_deref();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&load_config(config_dir)?);
            } else {
                let dir = match config_dir {
                    Some(dir) => dir.to_path_buf(),
                    None => get_config_dir()?,
                };
                run_interactive_config(&dir)?;
            }
        }
        Commands::Serve {
            file,
            host,
            port,
            offline,
        } => {
            let mut config = load_config(config_dir)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(file, config, offline).await?;
        }
        Commands::Ask {
            file,
            question,
            offline,
            show_sources,
        } => {
            let config = load_config(config_dir)?;
            tokio::task::spawn_blocking(move || {
                ask(&file, &question, &config, offline, show_sources)
            })
            .await??;
        }
        Commands::Check => {
            let config = load_config(config_dir)?;
            tokio::task::spawn_blocking(move || check(&config)).await??;
        }
    }

    Ok(())
}
