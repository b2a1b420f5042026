use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{Config, get_config_dir};
use crate::embeddings::{Embedder, HashingEmbedder};
use crate::generation::Generator;
use crate::ingest::load_document;
use crate::ollama::OllamaClient;
use crate::qa::{QaService, Response};

/// Load configuration from `config_dir`, or the default directory when none is given
#[inline]
pub fn load_config(config_dir: Option<&Path>) -> Result<Config> {
    let dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => get_config_dir().context("Failed to determine config directory")?,
    };
    Config::load(&dir).with_context(|| format!("Failed to load config from {}", dir.display()))
}

/// Load, embed and index the knowledge file, then wire the answering chain
///
/// With `offline` set, embeddings come from the local hashing embedder and
/// only generation talks to Ollama.
#[inline]
pub fn build_service(knowledge_file: &Path, config: &Config, offline: bool) -> Result<QaService> {
    let segments = load_document(knowledge_file, &config.chunking)
        .with_context(|| format!("Failed to load knowledge file {}", knowledge_file.display()))?;

    let ollama = Arc::new(OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?);

    let embedder: Arc<dyn Embedder> = if offline {
        info!("Offline mode: using local hashing embeddings");
        Arc::new(HashingEmbedder::default())
    } else {
        Arc::<OllamaClient>::clone(&ollama)
    };
    let generator: Arc<dyn Generator> = ollama;

    QaService::build(segments, embedder, generator, config).context("Failed to build knowledge index")
}

/// Index the knowledge file and serve the question form until shutdown
#[inline]
pub async fn serve(knowledge_file: PathBuf, config: Config, offline: bool) -> Result<()> {
    let addr = config
        .server
        .socket_addr()
        .context("Invalid server address")?;

    println!(
        "{} {}",
        style("📚 Indexing").bold(),
        style(knowledge_file.display()).cyan()
    );

    // Indexing makes blocking embedding calls
    let service = tokio::task::spawn_blocking(move || {
        if offline {
            warn_if_unreachable(&config);
        }
        build_service(&knowledge_file, &config, offline)
    })
    .await
    .context("Indexing task failed")??;

    println!(
        "{} {} segment(s) indexed",
        style("✅").green(),
        service.chain().retriever().index().len()
    );
    println!(
        "{} Open {} in a browser",
        style("🌐").bold(),
        style(format!("http://{addr}")).cyan()
    );
    println!("Press Ctrl+C to stop the server");

    crate::web::serve(Arc::new(service), addr).await?;

    println!("✅ Shutdown complete");
    Ok(())
}

/// Answer a single question from the command line
#[inline]
pub fn ask(
    knowledge_file: &Path,
    question: &str,
    config: &Config,
    offline: bool,
    show_sources: bool,
) -> Result<()> {
    let service = build_service(knowledge_file, config, offline)?;

    let response = service.respond(question).context("Failed to answer question")?;
    println!("{}", response.text().trim());

    if show_sources {
        if let Response::Answer(answer) = &response {
            println!();
            println!("{}", style("Sources:").bold());
            for retrieved in &answer.sources {
                let preview: String = retrieved.segment.text.chars().take(80).collect();
                println!(
                    "  [{}] {} (distance {:.4})",
                    retrieved.segment.ordinal,
                    style(preview.replace('\n', " ")).dim(),
                    retrieved.distance
                );
            }
        }
    }

    Ok(())
}

/// Verify Ollama is reachable and serves both configured models
#[inline]
pub fn check(config: &Config) -> Result<()> {
    println!(
        "Checking Ollama at {}:{}...",
        config.ollama.host, config.ollama.port
    );

    let client = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;
    match client.health_check() {
        Ok(()) => {
            info!("Ollama health check passed");
            println!(
                "{} Ollama connected with embedding model {} and generation model {}",
                style("✅").green(),
                config.ollama.embedding_model,
                config.ollama.generation_model
            );
            Ok(())
        }
        Err(e) => {
            error!("❌ Ollama health check failed: {:#}", e);
            println!(
                "{} Ollama is not ready at {}",
                style("❌").red(),
                client.base_url()
            );
            println!("Please ensure Ollama is running and both models are pulled.");
            println!("Use 'docs-qa config' to update connection settings.");
            Err(e)
        }
    }
}

/// Warn early when the generation model is unavailable; serving still proceeds
fn warn_if_unreachable(config: &Config) {
    match OllamaClient::new(&config.ollama) {
        Ok(client) => {
            if let Err(e) = client.generation_health_check() {
                warn!("⚠️  Ollama is not ready: {:#}", e);
                println!("Warning: Ollama may not be ready. Answers will fail until it is.");
            }
        }
        Err(e) => warn!("⚠️  Invalid Ollama settings: {}", e),
    }
}
