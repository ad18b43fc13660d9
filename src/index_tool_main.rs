//! Offline tooling: OCR a PDF, build the vector index, ask questions from the shell.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use rag_chatbot_backend::core::config::{AppPaths, ConfigService, EmbeddingBackend};
use rag_chatbot_backend::core::logging;
use rag_chatbot_backend::ingest::{format_pages, IndexBuilder, OcrOptions, OcrTools};
use rag_chatbot_backend::rag::VectorIndex;
use rag_chatbot_backend::state::{build_embedder, AppState};

#[derive(Parser, Debug)]
#[command(name = "rag-index", version, about = "Build and query the chatbot's vector index")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// OCR a scanned PDF into a plain-text file, one block per page.
    Extract {
        pdf: PathBuf,
        #[arg(short, long, default_value = "extracted_bangla_ocr.txt")]
        output: PathBuf,
        /// Tesseract language code(s).
        #[arg(long, default_value = "ben")]
        lang: String,
        #[arg(long, default_value_t = 300)]
        dpi: u32,
    },
    /// Chunk and embed a text file into the index directory.
    Build {
        input: PathBuf,
        /// Defaults to `index.dir` from the config.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Answer questions against the saved index and print the retrieved context.
    Ask {
        #[arg(required = true)]
        questions: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "rag-index.log");

    match cli.command {
        Command::Extract {
            pdf,
            output,
            lang,
            dpi,
        } => extract(pdf, output, OcrOptions { language: lang, dpi }).await,
        Command::Build { input, output } => build(paths, input, output).await,
        Command::Ask { questions } => ask(paths, questions).await,
    }
}

async fn extract(pdf: PathBuf, output: PathBuf, options: OcrOptions) -> anyhow::Result<()> {
    if !pdf.is_file() {
        bail!("PDF not found: {}", pdf.display());
    }
    let tools = OcrTools::locate()?;
    let pages = tools
        .extract_pages(&pdf, &options)
        .await
        .with_context(|| format!("Failed to OCR {}", pdf.display()))?;

    tokio::fs::write(&output, format_pages(&pages))
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!("Wrote {} pages to {}", pages.len(), output.display());
    Ok(())
}

async fn build(
    paths: Arc<AppPaths>,
    input: PathBuf,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config_service = ConfigService::new(paths.clone());
    let config = config_service.load_config()?;
    let api_key = match config.embedding.backend {
        EmbeddingBackend::Gemini => config_service.gemini_api_key()?,
        EmbeddingBackend::OpenaiCompatible => String::new(),
    };

    let text = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let source = input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());

    let embedder = build_embedder(&config, &api_key);
    let builder = IndexBuilder::new(embedder)
        .with_chunking(&config.chunking)
        .with_batching(config.embedding.batch_size, config.embedding.concurrency);
    let index = builder.build(&text, &source).await?;
    if index.is_empty() {
        bail!("{} produced no chunks", input.display());
    }

    let index_dir = output.unwrap_or_else(|| paths.resolve(&config.index.dir));
    let manifest = index.save(&index_dir)?;
    tracing::info!(
        "Saved {} vectors ({} dims, {}) to {}",
        manifest.count,
        manifest.dimensions,
        manifest.embedding_model,
        index_dir.display()
    );
    Ok(())
}

async fn ask(paths: Arc<AppPaths>, questions: Vec<String>) -> anyhow::Result<()> {
    let state = AppState::initialize(paths)?;
    println!(
        "Index {} holds {} passages\n",
        state.index_dir().display(),
        state.chat.index().len()
    );
    for question in questions {
        let response = state.chat.respond(&question).await;
        println!("Q: {}", question);
        if let Some(context) = &response.context {
            println!("--- context ---\n{}\n---------------", context);
        }
        println!("A: {}\n", response.answer);
    }
    Ok(())
}
