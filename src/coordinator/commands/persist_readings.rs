use crate::prelude::*;
use crate::api::{MessageId, NewReading};
use crate::readings::ReadingSlot;

use super::fetch_metadata::StationMetadata;
use super::retry_once_on_timeout;

use std::time::Duration;

pub struct PersistReadings<'a> {
    api: &'a dyn StorageApi,
    metadata: &'a StationMetadata,
    message: MessageId,
    slots: &'a [ReadingSlot],
    retry_delay: Duration,
}

impl<'a> PersistReadings<'a> {
    pub fn new(
        api: &'a dyn StorageApi,
        metadata: &'a StationMetadata,
        message: MessageId,
        slots: &'a [ReadingSlot],
        retry_delay: Duration,
    ) -> Self {
        Self {
            api,
            metadata,
            message,
            slots,
            retry_delay,
        }
    }

    /// Creates one reading per slot, in order. Returns how many were created.
    ///
    /// Readings already created stay in place if a later one fails.
    pub async fn run(&self) -> Result<usize> {
        let api = self.api;
        let mut created = 0;
        let mut unmatched = 0;

        for slot in self.slots {
            let Some(binding) = self.metadata.sensors.get(slot.sensor_index) else {
                unmatched += 1;
                continue;
            };

            let reading = NewReading {
                sensor: binding.sensor,
                station: self.metadata.station,
                station_sensor_link: binding.link,
                read_time: slot.read_time,
                value: slot.value,
                message: self.message,
            };
            let reading = &reading;

            retry_once_on_timeout(self.retry_delay, "creating reading", move || {
                api.create_reading(reading)
            })
            .await?;

            created += 1;
        }

        if unmatched > 0 {
            warn!(
                "data quality: {} values of message {} have no registered sensor",
                unmatched, self.message
            );
        }

        Ok(created)
    }
}
