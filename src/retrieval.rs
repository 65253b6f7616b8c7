use crate::file_error;
use crate::prelude::*;

use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Runs the LRGS retrieval client, writing its output to the message file.
pub struct Retrieval<'a> {
    lrgs: &'a config::Lrgs,
    output: &'a Path,
}

impl<'a> Retrieval<'a> {
    pub fn new(lrgs: &'a config::Lrgs, output: &'a Path) -> Self {
        Self { lrgs, output }
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "-u".to_string(),
            self.lrgs.username().to_string(),
            "-P".to_string(),
            self.lrgs.password().to_string(),
            "-h".to_string(),
            self.lrgs.host().to_string(),
            "-p".to_string(),
            self.lrgs.port().to_string(),
            "-f".to_string(),
            self.lrgs.search_file().display().to_string(),
            "-x".to_string(),
        ]
    }

    /// A non-zero exit is only logged; whatever the client wrote is still
    /// worth ingesting.
    pub async fn run(&self) -> Result<()> {
        info!(
            "retrieving messages from {}:{} as {} into {}",
            self.lrgs.host(),
            self.lrgs.port(),
            self.lrgs.username(),
            self.output.display()
        );

        let output = File::create(self.output).map_err(|err| {
            file_error!("cannot create {}: {}", self.output.display(), err)
        })?;

        let status = Command::new(self.lrgs.command())
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::from(output))
            .status()
            .await
            .map_err(|err| file_error!("cannot run {}: {}", self.lrgs.command(), err))?;

        if status.success() {
            info!("retrieval finished");
        } else {
            warn!("{} exited with {}", self.lrgs.command(), status);
        }

        Ok(())
    }
}
