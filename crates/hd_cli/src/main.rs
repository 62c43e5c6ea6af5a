use clap::{Args, Parser, Subcommand};
use hd_core::{ArticleView, ModelBackend, RecordStore, Result, Settings};
use hd_inference::{create_model, Summarizer};
use hd_sources::fetcher::{DEFAULT_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT};
use hd_sources::hackernews::DEFAULT_LIMIT;
use hd_sources::{DigestManager, Fetcher, HackerNewsSource, ReqwestClient};
use hd_storage::{create_store, MemoryStore, Publisher, Reconciler, StoreKind};
use hd_web::{create_app, AppState};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Hacker News digest: summarize, publish, reconcile", long_about = None)]
pub struct Cli {
    /// Record store: notion, or memory for an offline dry run
    #[arg(long, global = true, default_value = "notion")]
    store: StoreKind,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize the current top stories and publish them
    Digest(DigestArgs),
    /// Archive records that share a url, keeping the newest
    Dedupe {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Serve the article list over HTTP
    Serve {
        /// Defaults to $PORT, then 5000
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args, Debug)]
struct DigestArgs {
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,
    #[arg(long, default_value = "gemini")]
    model: ModelBackend,
    /// Extra attempts per fetch
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    retries: u32,
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    retry_delay_secs: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env()?;
    match cli.command {
        Commands::Digest(args) => digest(cli.store, args, &settings).await,
        Commands::Dedupe { yes } => dedupe(cli.store, yes, &settings).await,
        Commands::Serve { port } => serve(cli.store, port, &settings).await,
    }
}

async fn digest(kind: StoreKind, args: DigestArgs, settings: &Settings) -> Result<()> {
    // Resolve every credential before the first request.
    let model_settings = settings.model(args.model)?;
    let dry_run = (kind == StoreKind::Memory).then(MemoryStore::new);
    let store: Arc<dyn RecordStore> = match &dry_run {
        Some(memory) => Arc::new(memory.clone()),
        None => create_store(kind, settings)?,
    };
    let model = create_model(&model_settings)?;

    let client = Arc::new(ReqwestClient::new(DEFAULT_TIMEOUT)?);
    let fetcher = Arc::new(Fetcher::new(
        client,
        args.retries,
        Duration::from_secs(args.retry_delay_secs),
    ));
    let source = Arc::new(HackerNewsSource::new(fetcher.clone()));
    let manager = DigestManager::new(source, fetcher, Summarizer::new(model), Publisher::new(store));

    info!(limit = args.limit, model = %args.model, store = %kind, "🚀 Starting digest");
    let report = manager.run(args.limit).await?;

    if let Some(memory) = dry_run {
        let views: Vec<ArticleView> = memory.records().await.into_iter().map(ArticleView::from).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
    }
    info!("✅ Published {} of {} articles", report.published, report.candidates);
    Ok(())
}

async fn dedupe(kind: StoreKind, yes: bool, settings: &Settings) -> Result<()> {
    let store = create_store(kind, settings)?;
    let report = Reconciler::new(store)
        .reconcile(|doomed| yes || confirm(doomed.len()))
        .await?;
    info!(
        examined = report.examined,
        duplicates = report.duplicates,
        failed = report.failed,
        "✅ Archived {} duplicate records",
        report.archived
    );
    Ok(())
}

fn confirm(count: usize) -> bool {
    print!("\nArchive {} duplicate record(s)? (yes/no): ", count);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(_) => false,
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

async fn serve(kind: StoreKind, port: Option<u16>, settings: &Settings) -> Result<()> {
    let port = match port {
        Some(port) => port,
        None => settings.port()?,
    };
    let store = create_store(kind, settings)?;
    let app = create_app(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
