use crate::prelude::*;
use crate::api::MessageId;

use super::retry_once_on_timeout;

use std::time::Duration;

pub struct PersistMessage<'a> {
    api: &'a dyn StorageApi,
    message: &'a DecodedMessage,
    retry_delay: Duration,
}

impl<'a> PersistMessage<'a> {
    pub fn new(api: &'a dyn StorageApi, message: &'a DecodedMessage, retry_delay: Duration) -> Self {
        Self {
            api,
            message,
            retry_delay,
        }
    }

    /// Creates the message record; an error here must end the batch.
    pub async fn run(&self) -> Result<MessageId> {
        let api = self.api;
        let message = self.message;

        let id = retry_once_on_timeout(self.retry_delay, "creating message", move || {
            api.create_message(message)
        })
        .await?;

        debug!(
            "saved message {} from {} at {}",
            id, message.header.goes_id, message.header.arrival_time
        );

        Ok(id)
    }
}
