pub mod api;           // Remote storage service client
pub mod archive;       // JSON-lines archive of decoded messages
pub mod config;        // Configuration management
pub mod coordinator;   // Per-message ingestion state machine
pub mod error;         // Error types
pub mod message;       // Batch splitting and header parsing
pub mod options;       // Command line options parsing
pub mod prelude;       // Common imports and types
pub mod pseudobinary;  // Payload decoding
pub mod readings;      // Reading time reconstruction
pub mod retrieval;     // LRGS retrieval client invocation

// Get the package version from Cargo.toml
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::archive::MessageArchive;
use crate::prelude::*;
use crate::retrieval::Retrieval;

/// Initializes env_logger; `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    if let Err(e) = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init()
    {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

/// Retrieves (unless told to use existing data) and ingests one batch.
///
/// An error means a message or reading could not be persisted, or the batch
/// could not be read at all.
pub async fn app(options: Options, config: ConfigWrapper) -> Result<()> {
    info!("goes-ingest {} starting", CARGO_PKG_VERSION);
    config.log_summary();

    let message_file = options
        .message_file
        .clone()
        .unwrap_or_else(|| config.message_file().clone());

    if options.existing {
        info!("using existing data in {}", message_file.display());
    } else {
        Retrieval::new(config.lrgs(), &message_file).run().await?;
    }

    let batch = std::fs::read(&message_file)
        .map_err(|err| anyhow!("error reading {}: {}", message_file.display(), err))?;
    let batch = String::from_utf8_lossy(&batch);

    let api: Arc<dyn StorageApi> = Arc::new(HttpApi::new(config.api())?);
    let mut coordinator = Coordinator::new(config.clone(), api);

    if let Some(path) = config.archive_file() {
        match MessageArchive::new(path) {
            Ok(archive) => coordinator = coordinator.with_archive(archive),
            Err(err) => warn!("message archive disabled: {}", err),
        }
    }

    coordinator.run_batch(&batch).await?;

    info!("batch complete");
    Ok(())
}
