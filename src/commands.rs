use anyhow::{Context, Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::embeddings::{Embedder, OllamaClient};
use crate::extract::PdfTextExtractor;
use crate::pipeline::{IngestPipeline, QueryPipeline};
use crate::server::{AppState, run_server};
use crate::store::{
    BackendReport, BackendSelection, VectorStore, inspect_backend, select_backend,
};

/// Everything a request needs, wired once at startup
#[derive(Clone)]
pub struct Services {
    pub ingest: IngestPipeline,
    pub query: QueryPipeline,
    pub store: Arc<dyn VectorStore>,
    pub fallback_reason: Option<String>,
}

impl Services {
    /// Select the vector backend and build both pipelines around it
    #[inline]
    pub async fn open(config: &Config) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(
            OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?,
        );

        let selection = select_backend(config)
            .await
            .context("Failed to open vector store")?;
        Ok(Self::from_selection(selection, embedder))
    }

    #[inline]
    pub fn from_selection(selection: BackendSelection, embedder: Arc<dyn Embedder>) -> Self {
        let (store, fallback_reason) = selection.into_parts();
        Self {
            ingest: IngestPipeline::new(
                Arc::new(PdfTextExtractor),
                Arc::clone(&embedder),
                Arc::clone(&store),
            ),
            query: QueryPipeline::new(embedder, Arc::clone(&store)),
            store,
            fallback_reason,
        }
    }

    #[inline]
    pub fn into_app_state(self, max_upload_bytes: usize) -> AppState {
        AppState {
            ingest: self.ingest,
            query: self.query,
            store: self.store,
            fallback_reason: self.fallback_reason,
            max_upload_bytes,
        }
    }
}

/// Start the HTTP service, with optional overrides for the configured listen address
#[inline]
pub async fn serve_http(config_dir: &Path, host: Option<IpAddr>, port: Option<u16>) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    let configured = config
        .server
        .listen_addr()
        .context("Invalid server listen address")?;
    let addr = SocketAddr::new(
        host.unwrap_or(configured.ip()),
        port.unwrap_or(configured.port()),
    );

    let services = Services::open(&config).await?;
    if let Some(reason) = &services.fallback_reason {
        eprintln!(
            "{} {}",
            style("⚠ Using local fallback store:").yellow(),
            reason
        );
    }

    run_server(addr, services.into_app_state(config.server.max_upload_bytes)).await
}

/// Ingest PDF files from disk into the selected backend
#[inline]
pub async fn ingest_files(config_dir: &Path, paths: &[PathBuf]) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    let services = Services::open(&config).await?;

    let bar = if console::user_attended_stderr() {
        ProgressBar::new(paths.len() as u64).with_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] Ingesting {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        )
    } else {
        ProgressBar::hidden()
    };

    let mut total_chunks = 0;
    let mut failures = 0;

    for path in paths {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        bar.set_message(filename.clone());

        let result = match tokio::fs::read(path).await {
            Ok(bytes) => services
                .ingest
                .ingest(bytes, &filename)
                .await
                .map_err(anyhow::Error::from),
            Err(e) => Err(anyhow::Error::from(e)),
        };

        match result {
            Ok(report) => {
                total_chunks += report.chunks_stored;
                bar.println(format!(
                    "{} {} ({} chunks)",
                    style("✓").green(),
                    path.display(),
                    report.chunks_stored
                ));
            }
            Err(e) => {
                failures += 1;
                error!("Failed to ingest {}: {:#}", path.display(), e);
                bar.println(format!("{} {}: {:#}", style("✗").red(), path.display(), e));
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        "Ingested {} files ({} chunks) into {} backend",
        paths.len() - failures,
        total_chunks,
        services.store.kind()
    );
    eprintln!(
        "Stored {} chunks from {} of {} files in the {} backend",
        total_chunks,
        paths.len() - failures,
        paths.len(),
        services.store.kind()
    );

    if failures > 0 {
        bail!("{} of {} files failed to ingest", failures, paths.len());
    }
    Ok(())
}

/// Answer a question from the command line
#[inline]
pub async fn ask_question(config_dir: &Path, question: &str) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    let services = Services::open(&config).await?;

    let answer = services.query.ask(question).await?;
    println!("{}", answer.answer);
    Ok(())
}

/// Print configuration and connectivity of every collaborator without modifying either backend
#[inline]
pub async fn show_status(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    println!("📊 PDF RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🌐 Server:");
    println!("   Listen: {}:{}", config.server.host, config.server.port);
    println!("   Config: {}", config.config_file_path().display());
    println!();

    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => {
            let health = tokio::task::spawn_blocking(move || client.health_check()).await?;
            match health {
                Ok(()) => {
                    println!(
                        "   ✅ Ollama: Connected ({}:{})",
                        config.ollama.host, config.ollama.port
                    );
                    println!("   📋 Model: {}", config.ollama.model);
                    println!("   🔢 Dimension: {}", config.ollama.embedding_dimension);
                }
                Err(e) => println!("   ⚠️  Ollama: Unhealthy - {:#}", e),
            }
        }
        Err(e) => println!("   ❌ Ollama: Failed to create client - {:#}", e),
    }
    println!();

    println!("🔍 Vector Backend:");
    match inspect_backend(&config).await {
        Ok(BackendReport::Remote { index_name, info }) => {
            println!(
                "   ✅ Remote index: {} at {}",
                index_name, config.remote_index.url
            );
            if !info.is_null() {
                println!("   📋 Info: {}", info);
            }
        }
        Ok(BackendReport::Local {
            path,
            records,
            reason,
        }) => {
            println!("   ⚠️  Local fallback: {}", path.display());
            println!("   📝 Reason: {}", reason);
            println!("   📦 Chunks stored: {}", records);
        }
        Err(e) => println!("   ❌ No usable backend - {}", e),
    }

    Ok(())
}
