use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wings_cli::{HttpTextGenerator, WingsConfig};
use wings_connections::{CommandHandler, CommandRequest, CommandResponse, ConnectionManager, Item};
use wings_relevance::{DisabledGenerator, TextGenerator};
use wings_store::{MemoryStore, RecordStore};

#[derive(Parser)]
#[command(name = "wings")]
#[command(about = "Discover connections between saved pages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store snapshot file
    #[arg(long, global = true, default_value = ".wings/store.json")]
    store: PathBuf,

    /// Config file (overrides WINGS_CONFIG and ./wings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a JSON Command API request
    Command(CommandArgs),

    /// Add or replace items from a JSON array file
    Import(ImportArgs),

    /// Find connections for one item
    Analyze {
        item_id: String,
    },

    /// Batch connection pass (whole store when no ids are given)
    Batch {
        item_ids: Vec<String>,
    },

    /// Link two items by hand
    Link {
        item_id1: String,
        item_id2: String,
    },

    /// Remove the connection between two items
    Unlink {
        item_id1: String,
        item_id2: String,
    },

    /// List items connected to an item, best first
    Related {
        item_id: String,
    },

    /// Drop an item's connections and analyze it again
    Refresh {
        item_id: String,
    },

    /// Connection graph statistics
    Stats,
}

#[derive(Args)]
struct CommandArgs {
    /// Inline JSON payload (mutually exclusive with --file)
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to file containing JSON payload
    #[arg(long)]
    file: Option<PathBuf>,

    /// Pretty-print JSON response
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct ImportArgs {
    /// JSON file with an array of items
    path: PathBuf,

    /// Run a batch pass over the imported items
    #[arg(long)]
    analyze: bool,
}

struct App {
    store: Arc<MemoryStore>,
    store_path: PathBuf,
    handler: CommandHandler,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = WingsConfig::load(cli.config.as_deref())?;
    let app = App::open(cli.store, config).await?;

    let response = match cli.command {
        Commands::Command(args) => {
            let raw = read_payload(&args)?;
            let response = app.execute_raw(&raw).await?;
            print_response(&response, args.pretty)?;
            response
        }
        Commands::Import(args) => {
            let response = app.import(&args.path, args.analyze).await?;
            print_response(&response, true)?;
            response
        }
        Commands::Analyze { item_id } => app.run(CommandRequest::AnalyzeItem { item_id }).await?,
        Commands::Batch { item_ids } => {
            app.run(CommandRequest::BatchAnalyze {
                item_ids: (!item_ids.is_empty()).then_some(item_ids),
            })
            .await?
        }
        Commands::Link { item_id1, item_id2 } => {
            app.run(CommandRequest::Link { item_id1, item_id2 }).await?
        }
        Commands::Unlink { item_id1, item_id2 } => {
            app.run(CommandRequest::Unlink { item_id1, item_id2 }).await?
        }
        Commands::Related { item_id } => app.run(CommandRequest::Related { item_id }).await?,
        Commands::Refresh { item_id } => app.run(CommandRequest::Refresh { item_id }).await?,
        Commands::Stats => app.run(CommandRequest::Stats).await?,
    };

    if !response.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}

impl App {
    async fn open(store_path: PathBuf, config: WingsConfig) -> Result<Self> {
        let store = Arc::new(
            MemoryStore::load_or_default(&store_path)
                .await
                .with_context(|| format!("Failed to open store {}", store_path.display()))?,
        );

        let generator: Arc<dyn TextGenerator> = match &config.llm {
            Some(llm) => {
                log::debug!("Semantic scoring via {} ({})", llm.endpoint, llm.model);
                Arc::new(HttpTextGenerator::new(llm)?)
            }
            None => {
                log::debug!("No [llm] section configured, semantic scoring disabled");
                Arc::new(DisabledGenerator)
            }
        };

        let records: Arc<dyn RecordStore> = store.clone();
        let manager = ConnectionManager::with_config(records, generator, config.connections)?;

        Ok(Self {
            store,
            store_path,
            handler: CommandHandler::new(Arc::new(manager)),
        })
    }

    /// Execute and pretty-print a typed request
    async fn run(&self, request: CommandRequest) -> Result<CommandResponse> {
        let response = self.execute(request).await?;
        print_response(&response, true)?;
        Ok(response)
    }

    async fn execute(&self, request: CommandRequest) -> Result<CommandResponse> {
        let mutating = request.is_mutating();
        let response = self.handler.execute(request).await;
        if mutating && response.is_ok() {
            self.save().await?;
        }
        Ok(response)
    }

    async fn execute_raw(&self, raw: &str) -> Result<CommandResponse> {
        match serde_json::from_str::<CommandRequest>(raw) {
            Ok(request) => self.execute(request).await,
            // The handler turns the parse failure into an error envelope
            Err(_) => Ok(self.handler.execute_json(raw).await),
        }
    }

    async fn import(&self, path: &Path, analyze: bool) -> Result<CommandResponse> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read items from {}", path.display()))?;
        let items: Vec<Item> = serde_json::from_str(&raw)
            .with_context(|| format!("Expected a JSON array of items in {}", path.display()))?;

        let (valid, skipped): (Vec<Item>, Vec<Item>) =
            items.into_iter().partition(|item| !item.id.trim().is_empty());
        if !skipped.is_empty() {
            log::warn!("Skipping {} items without an id", skipped.len());
        }

        let ids: Vec<String> = valid.iter().map(|item| item.id.clone()).collect();
        let imported = self.store.upsert_items(valid).await;
        self.save().await?;
        log::info!("Imported {} items from {}", imported, path.display());

        if analyze {
            return self
                .execute(CommandRequest::BatchAnalyze {
                    item_ids: Some(ids),
                })
                .await;
        }

        Ok(CommandResponse::ok(json!({
            "imported": imported,
            "skipped": skipped.len(),
            "totalItems": self.store.item_count().await,
        }))
        .with_message(format!("imported {imported} items")))
    }

    async fn save(&self) -> Result<()> {
        self.store
            .save(&self.store_path)
            .await
            .with_context(|| format!("Failed to save store {}", self.store_path.display()))
    }
}

fn read_payload(args: &CommandArgs) -> Result<String> {
    if let Some(raw) = &args.json {
        return Ok(raw.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON from {}", path.display()));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read JSON from stdin")?;

    if buffer.trim().is_empty() {
        anyhow::bail!("Command request is empty. Provide --json, --file, or pipe JSON via stdin.");
    }

    Ok(buffer)
}

fn print_response(response: &CommandResponse, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(response)?
    } else {
        serde_json::to_string(response)?
    };
    println!("{output}");
    Ok(())
}
