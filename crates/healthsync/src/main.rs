use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use healthsync::config::{Config, ReferenceMode};
use healthsync::references::{load_reference_tables, BundledReferences, ObjectReferences};
use healthsync::storage::FsObjectStore;
use healthsync::Pipeline;
use healthsync_core::pipeline::{RunFailure, StorageEvent};
use healthsync_core::storage::{ObjectRef, ObjectStore, ReferenceSource, TableBackend};

/// healthsync - Enrich member fitness exports and load them into per-member tables
#[derive(Parser, Debug)]
#[command(name = "healthsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Settings that take precedence over the `Config::from_env` defaults.
#[derive(Args, Debug)]
struct Overrides {
    /// SQLite database path
    #[arg(long, global = true, env = "HEALTHSYNC_SQLITE_PATH")]
    sqlite_path: Option<String>,

    /// Object store root directory
    #[arg(long, global = true, env = "HEALTHSYNC_OBJECT_ROOT")]
    object_root: Option<PathBuf>,

    /// Member table prefix
    #[arg(long, global = true, env = "HEALTHSYNC_TABLE_PREFIX")]
    table_prefix: Option<String>,

    /// Partitions persisted at once
    #[arg(long, global = true, env = "HEALTHSYNC_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// Whole-run deadline in seconds
    #[arg(long, global = true, env = "HEALTHSYNC_RUN_TIMEOUT_SECS")]
    run_timeout_secs: Option<u64>,

    /// Reference table source
    #[arg(long, global = true, value_enum, env = "HEALTHSYNC_REFERENCES")]
    references: Option<ReferenceMode>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(sqlite_path) = self.sqlite_path {
            config.sqlite_path = sqlite_path;
        }
        if let Some(object_root) = self.object_root {
            config.object_root = object_root;
        }
        if let Some(table_prefix) = self.table_prefix {
            config.table_prefix = table_prefix;
        }
        if let Some(max_concurrency) = self.max_concurrency {
            config.max_concurrency = max_concurrency;
        }
        if let Some(run_timeout_secs) = self.run_timeout_secs {
            config.run_timeout_seconds = run_timeout_secs;
        }
        if let Some(references) = self.references {
            config.references = references;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest one object
    Run {
        /// Bucket holding the export
        #[arg(long)]
        bucket: String,

        /// Object name of the export
        #[arg(long)]
        name: String,
    },
    /// Handle an object-change notification read from a JSON file
    Event {
        /// Path to the event payload
        path: PathBuf,
    },
    /// Load and validate the reference tables
    References,
}

#[derive(Serialize)]
struct ReferenceCounts {
    sleep_bands: usize,
    calorie_bands: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_json);

    let mut config = Config::from_env();
    cli.overrides.apply(&mut config);

    let store = FsObjectStore::new(&config.object_root);
    tracing::debug!(root = %store.root().display(), "Using filesystem object store");
    let objects: Arc<dyn ObjectStore> = Arc::new(store);
    let references = reference_source(&config, Arc::clone(&objects));

    match cli.command {
        Command::Run { bucket, name } => {
            let pipeline = build_pipeline(&config, references, objects).await?;
            let summary = pipeline
                .run(ObjectRef::new(bucket, name))
                .await
                .inspect_err(log_failed_members)?;
            print_json(&summary)?;
        }
        Command::Event { path } => {
            let payload = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading event payload {}", path.display()))?;
            let event: StorageEvent =
                serde_json::from_str(&payload).context("parsing event payload")?;

            let pipeline = build_pipeline(&config, references, objects).await?;
            let outcome = pipeline
                .handle_event(&event)
                .await
                .inspect_err(log_failed_members)?;
            print_json(&outcome)?;
        }
        Command::References => {
            let tables = load_reference_tables(references.as_ref()).await?;
            print_json(&ReferenceCounts {
                sleep_bands: tables.sleep_bands().len(),
                calorie_bands: tables.calorie_bands().len(),
            })?;
        }
    }

    Ok(())
}

/// Initialize the tracing subscriber. Logs go to stderr; stdout carries results.
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "healthsync=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn reference_source(config: &Config, objects: Arc<dyn ObjectStore>) -> Arc<dyn ReferenceSource> {
    match config.references {
        ReferenceMode::Bundled => Arc::new(BundledReferences),
        ReferenceMode::Objects => Arc::new(ObjectReferences::new(
            objects,
            config.sleep_reference_object(),
            config.calorie_reference_object(),
        )),
    }
}

async fn build_pipeline(
    config: &Config,
    references: Arc<dyn ReferenceSource>,
    objects: Arc<dyn ObjectStore>,
) -> Result<Pipeline> {
    let pipeline_config = config.pipeline_config()?;
    let backend = table_backend(config).await?;

    tracing::info!(
        table_prefix = pipeline_config.table_prefix(),
        max_concurrency = pipeline_config.max_concurrency(),
        run_timeout_secs = pipeline_config.run_timeout().as_secs(),
        references = ?config.references,
        "Pipeline configured"
    );

    Ok(Pipeline::new(pipeline_config, references, objects, backend))
}

#[cfg(feature = "sqlite")]
async fn table_backend(config: &Config) -> Result<Arc<dyn TableBackend>> {
    use healthsync::storage::SqliteTableBackend;

    let backend = SqliteTableBackend::new(&config.sqlite_path)
        .await
        .with_context(|| format!("opening {}", config.sqlite_path))?;
    tracing::info!(path = %config.sqlite_path, "Using SQLite table backend");
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "sqlite"))]
async fn table_backend(_config: &Config) -> Result<Arc<dyn TableBackend>> {
    use healthsync::storage::InMemoryTableBackend;

    tracing::warn!("Built without sqlite; rows are kept in memory and lost on exit");
    Ok(Arc::new(InMemoryTableBackend::new()))
}

/// Names each member whose partition was not committed.
fn log_failed_members(failure: &RunFailure) {
    for member_id in failure.failed_members() {
        tracing::error!(member_id, "Partition not committed; source kept for retry");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
