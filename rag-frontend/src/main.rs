use anyhow::Context;
use clap::{Parser, Subcommand};
use client_core::observability::init_tracing;
use dotenvy::dotenv;
use rag_frontend::config::get_configuration;
use rag_frontend::models::{PreviewState, UploadFile, UploadStatus};
use rag_frontend::AppState;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "rag-frontend")]
#[command(about = "Browse, preview, upload and chat with documents on the RAG backend")]
struct Cli {
    /// Override the backend base URL from configuration.
    #[arg(long, global = true)]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of the document library.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Preview a document and optionally ask a question about it.
    Preview {
        document_id: String,
        #[arg(long)]
        ask: Option<String>,
        /// Write the fetched file here.
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Upload PDF files for indexing.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        collection: Option<String>,
    },
    /// List the backend's collections.
    Collections,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let mut configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    if let Some(url) = cli.backend_url {
        configuration.backend.url = url;
    }

    init_tracing(
        "rag-frontend",
        &configuration.common.log_level,
        configuration.common.log_format,
    );
    rag_frontend::services::metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to register metrics: {}", e))?;

    info!(backend_url = %configuration.backend.url, "Starting rag-frontend");
    let state = AppState::from_settings(configuration)?;

    match cli.command {
        Commands::List { page, page_size } => list(&state, page, page_size).await,
        Commands::Preview {
            document_id,
            ask,
            save,
        } => preview(&state, document_id, ask, save).await,
        Commands::Upload { files, collection } => upload(&state, files, collection).await,
        Commands::Collections => collections(&state).await,
    }
}

async fn list(state: &AppState, page: u32, page_size: Option<u32>) -> anyhow::Result<()> {
    let mut pager = state.pager();
    let page_size = page_size.unwrap_or(pager.cursor().page_size);
    pager
        .set_page(page, page_size)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;

    for doc in pager.items() {
        println!(
            "{:>6}  {:<40}  {:<16}  {:>9}  {}",
            doc.id,
            doc.filename,
            doc.collection_name,
            doc.display_size(),
            doc.upload_date.as_deref().unwrap_or("-")
        );
    }

    let cursor = pager.cursor();
    println!(
        "page {} of {} ({} documents)",
        cursor.page_number,
        cursor.total_pages().max(1),
        cursor.total_records
    );
    Ok(())
}

async fn preview(
    state: &AppState,
    document_id: String,
    ask: Option<String>,
    save: Option<PathBuf>,
) -> anyhow::Result<()> {
    state.open_document(document_id);

    match state.preview.settled().await {
        PreviewState::Ready(ready) => {
            println!(
                "{} ({} bytes, collection {})",
                ready.file_name, ready.resource.size_bytes, ready.document.collection_name
            );
            if !ready.is_previewable() {
                println!("Preview is only available for PDF files; use --save to download it.");
            }
        }
        failed @ PreviewState::Error { .. } => {
            anyhow::bail!(
                "Preview failed: {}",
                failed.user_message().unwrap_or("unknown error")
            );
        }
        _ => anyhow::bail!("Preview was cancelled"),
    }

    if let Some(path) = save {
        let (file_name, data) = state
            .preview
            .download()
            .context("Preview resource is no longer available")?;
        tokio::fs::write(&path, &data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Saved {} to {}", file_name, path.display());
    }

    if let Some(question) = ask {
        let mut session = state.chat.subscribe();
        tokio::time::timeout(
            Duration::from_secs(5),
            session.wait_for(|s| !s.collection_name.is_empty()),
        )
        .await
        .context("Timed out waiting for the document's collection")?
        .context("Chat session closed")?;

        if state.chat.ask(&question).is_none() {
            anyhow::bail!("Question was not sent");
        }

        let session = state.chat.idle().await;
        if let Some(answer) = session.last() {
            println!("{}", answer.text);
            for citation in answer.citations.iter().flatten() {
                println!(
                    "  - {} {}",
                    citation.source.as_deref().unwrap_or("?"),
                    citation
                        .page_number
                        .as_ref()
                        .map(|p| format!("(page {})", p))
                        .unwrap_or_default()
                );
            }
            if answer.is_error {
                anyhow::bail!("Chat request failed");
            }
        }
    }

    Ok(())
}

async fn upload(
    state: &AppState,
    files: Vec<PathBuf>,
    collection: Option<String>,
) -> anyhow::Result<()> {
    let collection =
        collection.unwrap_or_else(|| state.settings.upload.collection_name.clone());

    let mut notifications = state.notifier.subscribe();

    let mut submitted = Vec::new();
    for path in &files {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        submitted.push(state.uploads.submit_to(UploadFile::new(file_name, data), &collection));
    }

    let mut failed = 0;
    for upload in submitted {
        let status = upload.completion.await.context("Upload task panicked")?;
        if status == UploadStatus::Error {
            failed += 1;
        }
    }

    while let Ok(notification) = notifications.try_recv() {
        println!("{}", notification.message);
    }

    for task in state.uploads.tasks() {
        println!(
            "{:<40}  {:>3}%  {}",
            task.file_name,
            task.progress_percent,
            task.status.label()
        );
    }

    if failed > 0 {
        anyhow::bail!("{} of {} uploads failed", failed, files.len());
    }
    Ok(())
}

async fn collections(state: &AppState) -> anyhow::Result<()> {
    let collections = state
        .collections()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;

    for collection in collections {
        println!("{:<24}  {:>8} vectors", collection.name, collection.vectors_count);
    }
    Ok(())
}
