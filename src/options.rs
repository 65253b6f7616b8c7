use clap::Parser;

use std::path::PathBuf;

/// GOES Ingest - loads GOES DCP sensor messages into the station database
#[derive(Debug, Default, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read
    #[clap(short = 'c', long = "config", default_value = "config.yaml")]
    pub config_file: String,

    /// Skip the LRGS download and ingest the existing message file
    #[clap(short = 'e', long = "existing")]
    pub existing: bool,

    /// Message file to use instead of the configured one
    #[clap(short = 'm', long = "messages")]
    pub message_file: Option<PathBuf>,

    /// Log level, overrides the config file
    #[clap(short = 'l', long = "loglevel")]
    pub loglevel: Option<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let options = Options::parse_from(["goes-ingest", "-c", "ingest.yaml", "--existing", "-m", "batch.txt"]);

        assert_eq!(options.config_file, "ingest.yaml");
        assert!(options.existing);
        assert_eq!(options.message_file, Some(PathBuf::from("batch.txt")));
        assert_eq!(options.loglevel, None);
    }

    #[test]
    fn defaults() {
        let options = Options::parse_from(["goes-ingest"]);

        assert_eq!(options.config_file, "config.yaml");
        assert!(!options.existing);
    }
}
