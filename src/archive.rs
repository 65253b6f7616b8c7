use crate::prelude::*;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Appends every decoded data message to a JSON-lines file.
#[derive(Debug)]
pub struct MessageArchive {
    file: Mutex<std::fs::File>,
    path: PathBuf,
    messages_written: Mutex<u64>,
}

impl MessageArchive {
    pub fn new(path: &Path) -> Result<Self> {
        info!("Opening message archive at {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to open message archive {}: {}", path.display(), e);
                return Err(e.into());
            }
        };

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
            messages_written: Mutex::new(0),
        })
    }

    pub fn write(&self, message: &DecodedMessage) -> Result<()> {
        let mut json = serde_json::to_value(message)?;
        if let Some(object) = json.as_object_mut() {
            object.insert(
                "archived_at".to_string(),
                serde_json::Value::String(
                    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                ),
            );
        }
        let line = serde_json::to_string(&json)?;

        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("Failed to lock message archive"))?;
        writeln!(file, "{}", line)?;
        file.flush()?;

        let mut written = self
            .messages_written
            .lock()
            .map_err(|_| anyhow!("Failed to lock archive counter"))?;
        *written += 1;
        trace!("{} messages archived to {}", *written, self.path.display());

        Ok(())
    }

    pub fn messages_written(&self) -> u64 {
        self.messages_written.lock().map(|n| *n).unwrap_or(0)
    }
}
