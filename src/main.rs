use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paygate::config::AppConfig;
use paygate::domain::order::OrderCriteria;
use paygate::domain::ports::OrderRepositoryRef;
use paygate::infrastructure::in_memory::InMemoryOrderRepository;
use paygate::interfaces::csv::operation_reader::OperationReader;
use paygate::interfaces::csv::order_writer::OrderWriter;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Payment operations CSV file
    input: PathBuf,

    /// Gateway configuration (JSON). Defaults to a single simulated gateway.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to persistent order database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    let orders = open_orders(cli.db_path.as_deref())?;
    let manager = config.manager(orders.clone());

    let file = File::open(&cli.input).into_diagnostic()?;
    for operation in OperationReader::new(file).operations() {
        match operation {
            Ok(operation) => match operation.execute(&manager, orders.as_ref()).await {
                Ok(outcome) => info!(?outcome, "Operation completed"),
                Err(e) => error!(code = %e.code(), "Error processing operation: {}", e),
            },
            Err(e) => error!(code = %e.code(), "Error reading operation: {}", e),
        }
    }

    let all = orders.find_by(&OrderCriteria::default()).await?;
    let stdout = io::stdout();
    OrderWriter::new(stdout.lock()).write_orders(&all)?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_orders(db_path: Option<&Path>) -> paygate::error::Result<OrderRepositoryRef> {
    use paygate::infrastructure::rocksdb::RocksDbOrderRepository;

    Ok(match db_path {
        Some(path) => Arc::new(RocksDbOrderRepository::open(path)?),
        None => Arc::new(InMemoryOrderRepository::new()),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_orders(db_path: Option<&Path>) -> paygate::error::Result<OrderRepositoryRef> {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(Arc::new(InMemoryOrderRepository::new()))
}
