use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use doc_indexer::config::{AppConfig, CliConfig, FileConfig};
use doc_indexer::methods::create_dispatcher;
use doc_indexer::rpc::{methods, AppServices, Dispatcher, RequestEnvelope};
use doc_indexer::search::{create_search_backend, load_seed_documents, SearchEngine, SearchService};
use doc_indexer::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use doc_indexer::stdio::{print_stdio_usage, StdioServer};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(version, about = "Document search and indexing service")]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// JSON file with an array of documents to index at startup.
    #[clap(long, value_parser = parse_path)]
    pub seed_file: Option<PathBuf>,

    /// Search backend implementation.
    #[clap(long, value_enum, default_value_t = SearchEngine::Memory)]
    pub search_engine: SearchEngine,

    /// Serve JSON-RPC over stdin/stdout instead of HTTP.
    #[clap(long)]
    pub stdio: bool,

    /// Print stdio mode usage and exit.
    #[clap(long)]
    pub stdio_help: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one search and print the JSON result.
    Search {
        query: String,

        #[clap(long)]
        collection: Option<String>,

        #[clap(long)]
        limit: Option<usize>,

        #[clap(long)]
        threshold: Option<f32>,
    },
}

impl CliArgs {
    /// Protocol or one-shot output goes to stdout, so logs must not.
    fn logs_to_stderr(&self) -> bool {
        self.stdio || self.command.is_some()
    }

    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            seed_file: self.seed_file.clone(),
            search_engine: self.search_engine,
        }
    }
}

fn init_tracing(to_stderr: bool) -> Result<()> {
    let writer = if to_stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize tracing")
}

fn build_dispatcher(app_config: &AppConfig) -> Result<Dispatcher> {
    let documents = match &app_config.seed_file {
        Some(path) => {
            let documents = load_seed_documents(path)?;
            info!("Loaded {} seed documents from {:?}", documents.len(), path);
            documents
        }
        None => Vec::new(),
    };

    let backend = create_search_backend(app_config.search.engine, documents);
    let search = SearchService::new(backend, app_config.search.clone());
    let services = Arc::new(AppServices::new(
        app_config.service_name.clone(),
        doc_indexer::version(),
        search,
    ));

    create_dispatcher(services, app_config.dispatch.clone()).context("Failed to build method registry")
}

async fn run_search(
    dispatcher: &Dispatcher,
    query: String,
    collection: Option<String>,
    limit: Option<usize>,
    threshold: Option<f32>,
) -> Result<()> {
    let mut params = json!({ "query": query });
    if let Some(collection) = collection {
        params["filters"] = json!({ "collection": collection });
    }
    if let Some(limit) = limit {
        params["limit"] = Value::from(limit);
    }
    if let Some(threshold) = threshold {
        params["threshold"] = Value::from(threshold);
    }

    let response = dispatcher
        .dispatch(RequestEnvelope::new(methods::DOCUMENT_SEARCH, params))
        .await;
    match response.outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => Err(e).context("Search failed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    if cli_args.stdio_help {
        print_stdio_usage();
        return Ok(());
    }

    init_tracing(cli_args.logs_to_stderr())?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    metrics::init_metrics();
    let dispatcher = build_dispatcher(&app_config)?;

    if let Some(Command::Search {
        query,
        collection,
        limit,
        threshold,
    }) = cli_args.command
    {
        return run_search(&dispatcher, query, collection, limit, threshold).await;
    }

    if cli_args.stdio {
        info!("Serving JSON-RPC over stdio");
        let handled = StdioServer::new(dispatcher)
            .run_stdio()
            .await
            .context("stdio transport failed")?;
        info!("stdio session finished after {} requests", handled);
        return Ok(());
    }

    info!(
        "Starting {} {} (search engine: {:?})",
        app_config.service_name,
        doc_indexer::version(),
        app_config.search.engine
    );
    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        streaming: app_config.streaming.clone(),
    };
    run_server(server_config, dispatcher, doc_indexer::GIT_HASH.to_string()).await
}
