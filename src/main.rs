use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use voucher_redemption::application::engine::RedemptionEngine;
use voucher_redemption::domain::ports::RedemptionStoreBox;
use voucher_redemption::infrastructure::in_memory::InMemoryRedemptionStore;
#[cfg(feature = "storage-rocksdb")]
use voucher_redemption::infrastructure::rocksdb::RocksDBStore;
use voucher_redemption::interfaces::csv::operation_reader::OperationReader;
use voucher_redemption::interfaces::csv::stats_writer::StatsWriter;
use voucher_redemption::interfaces::json::seed::Seed;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON seed: engine configuration and collaborator state
    seed: PathBuf,

    /// Operations CSV file
    operations: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<PathBuf>) -> Result<RedemptionStoreBox> {
    match db_path {
        Some(path) => Ok(Box::new(RocksDBStore::open(path).into_diagnostic()?)),
        None => Ok(Box::new(InMemoryRedemptionStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<PathBuf>) -> Result<RedemptionStoreBox> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Box::new(InMemoryRedemptionStore::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .into_diagnostic()?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let seed = Seed::from_reader(File::open(&cli.seed).into_diagnostic()?).into_diagnostic()?;
    let world = seed.build_world().await.into_diagnostic()?;
    let store = open_store(cli.db_path)?;
    let engine = RedemptionEngine::open(seed.config, world.collaborators(), store)
        .await
        .into_diagnostic()?;

    let reader = OperationReader::new(File::open(&cli.operations).into_diagnostic()?);
    for op_result in reader.operations() {
        match op_result {
            Ok(op) => {
                if let Err(e) = op.execute(&engine, &world.clock).await {
                    match e.code() {
                        Some(code) => eprintln!("Operation rejected ({}): {}", code, e),
                        None => eprintln!("Error processing operation: {}", e),
                    }
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {}", e);
            }
        }
    }

    let stats = engine.all_campaign_stats().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = StatsWriter::new(stdout.lock());
    writer.write_stats(stats).into_diagnostic()?;

    Ok(())
}
