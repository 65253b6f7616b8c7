use crate::prelude::*;

use std::time::Duration;

pub struct CheckDuplicate<'a> {
    api: &'a dyn StorageApi,
    header: &'a MessageHeader,
    window: Duration,
}

impl<'a> CheckDuplicate<'a> {
    pub fn new(api: &'a dyn StorageApi, header: &'a MessageHeader, window: Duration) -> Self {
        Self {
            api,
            header,
            window,
        }
    }

    /// True if the store already holds this message.
    ///
    /// Lookup failures are logged and count as "not stored", so a flaky
    /// lookup never loses a message.
    pub async fn run(&self) -> bool {
        // config bounds the window to a day, well inside i64 seconds
        let window = chrono::Duration::seconds(self.window.as_secs() as i64);
        let start = self.header.arrival_time - window;
        let end = self.header.arrival_time + window;

        match self.api.find_messages(&self.header.goes_id, start, end).await {
            Ok(existing) if !existing.is_empty() => {
                info!(
                    "message from {} at {} has already been saved",
                    self.header.goes_id, self.header.arrival_time
                );
                true
            }
            Ok(_) => false,
            Err(ApiError::Timeout(err)) => {
                warn!(
                    "time-out while checking for duplicates of {} at {}: {}",
                    self.header.goes_id, self.header.arrival_time, err
                );
                false
            }
            Err(ApiError::InvalidJson(err)) => {
                warn!("invalid JSON response while checking for duplicates: {}", err);
                false
            }
            Err(err) => {
                warn!(
                    "error while checking for duplicates of {} at {}: {}",
                    self.header.goes_id, self.header.arrival_time, err
                );
                false
            }
        }
    }
}
