use crate::prelude::*;

/// Advertises that a batch is being ingested. Advisory only: failures are
/// logged and ignored.
pub struct SetReceivingData<'a> {
    api: &'a dyn StorageApi,
    active: bool,
}

impl<'a> SetReceivingData<'a> {
    pub fn new(api: &'a dyn StorageApi, active: bool) -> Self {
        Self { api, active }
    }

    pub async fn run(&self) {
        match self.api.set_receiving_data(self.active).await {
            Ok(()) => debug!("receiving_data set to {}", self.active),
            Err(err) => warn!("failed to set receiving_data to {}: {}", self.active, err),
        }
    }
}
