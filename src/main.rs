use goes_ingest::prelude::*;

#[tokio::main]
async fn main() {
    let options = Options::new();

    let config = ConfigWrapper::new(&options.config_file).unwrap_or_else(|err| {
        eprintln!("Failed to load config {}: {:?}", options.config_file, err);
        std::process::exit(255);
    });

    goes_ingest::init_logging(options.loglevel.as_deref().unwrap_or(config.loglevel()));

    if let Err(err) = goes_ingest::app(options, config).await {
        error!("Automatic download of data failed: {:#}", err);
        std::process::exit(1);
    }
}
