use clap::Parser;
use ns_core::types::CATEGORIES;
use ns_core::Result;
use ns_ingest::{IngestPipeline, IngestRequest, NewsApiClient, SearchOrchestrator};
use ns_storage::create_store;
use ns_summarize::{create_model, Config, SummarizeService};
use ns_web::{create_app, AppState, BehaviorTracker};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "memory", help = "Storage backend: memory or sqlite")]
    storage: String,
    #[arg(long, default_value = "newssphere.db")]
    db_path: String,
    /// NewsAPI key; falls back to the NEWS_API_KEY environment variable.
    #[arg(long)]
    news_api_key: Option<String>,
    /// OpenAI key; falls back to the OPENAI_API_KEY environment variable.
    #[arg(long)]
    openai_api_key: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server.
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
    /// Fetch headlines for one category, or search results for a query.
    Fetch {
        #[arg(long, default_value = "general")]
        category: String,
        #[arg(long)]
        query: Option<String>,
    },
    /// Refresh headlines across categories.
    Refresh {
        /// Categories to refresh; all known categories when omitted.
        categories: Vec<String>,
    },
    /// Search stored articles, broadening until enough results are found.
    Search { query: String },
    /// Summarize a piece of text from the command line.
    Summarize {
        #[arg(long, default_value_t = 150)]
        max_length: usize,
        text: String,
    },
}

fn key_or_env(flag: Option<String>, var: &str) -> Option<String> {
    flag.or_else(|| std::env::var(var).ok())
        .filter(|k| !k.is_empty())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let stores = create_store(cli.storage.as_str(), Some(cli.db_path.as_str())).await?;
    info!("💾 Storage initialized (using {})", cli.storage);

    let news_api_key = key_or_env(cli.news_api_key, "NEWS_API_KEY");
    if news_api_key.is_none() {
        warn!("No NewsAPI key configured; fetch and search ingestion will fail");
    }
    let source = Arc::new(NewsApiClient::new(news_api_key.unwrap_or_default()));
    let pipeline = Arc::new(IngestPipeline::new(source, stores.articles.clone()));
    let search = Arc::new(SearchOrchestrator::new(
        stores.articles.clone(),
        pipeline.clone(),
    ));

    let model = create_model(&Config {
        api_key: key_or_env(cli.openai_api_key, "OPENAI_API_KEY"),
        model_name: None,
    });
    match &model {
        Some(model) => info!("🧠 Summarization model initialized (using {})", model.name()),
        None => info!("🧠 No summarization model configured, using fallback summarizer"),
    }
    let summarizer = Arc::new(SummarizeService::new(model));

    match cli.command {
        Commands::Serve { addr } => {
            let app = create_app(AppState {
                articles: stores.articles.clone(),
                users: stores.users.clone(),
                pipeline,
                search,
                summarizer,
                tracker: Arc::new(BehaviorTracker::new(stores.kv.clone())),
            });
            info!("🌐 Listening on {}", addr);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await?;
        }
        Commands::Fetch { category, query } => {
            let outcome = pipeline
                .ingest(IngestRequest {
                    category: Some(category),
                    query,
                })
                .await?;
            info!(
                "📰 Processed {} articles, {} new ({})",
                outcome.processed, outcome.inserted, outcome.category
            );
        }
        Commands::Refresh { categories } => {
            let categories = if categories.is_empty() {
                CATEGORIES.iter().map(|c| c.to_string()).collect()
            } else {
                categories
            };
            for (category, result) in pipeline.ingest_categories(&categories).await {
                match result {
                    Ok(outcome) => info!(
                        "📰 {}: {} processed, {} new",
                        category, outcome.processed, outcome.inserted
                    ),
                    Err(e) => warn!("⚠️ {}: {}", category, e),
                }
            }
        }
        Commands::Search { query } => {
            let results = search.search(&query).await?;
            info!("🔎 {} results for {:?}", results.len(), query);
            for article in results {
                println!("{}  {}", article.published_at.format("%Y-%m-%d"), article.title);
                println!("    {}", article.url);
            }
        }
        Commands::Summarize { max_length, text } => {
            let summary = summarizer.summarize(&text, Some(max_length)).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
