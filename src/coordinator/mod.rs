use crate::prelude::*;

pub mod commands;

use crate::api::MessageId;
use crate::archive::MessageArchive;
use crate::message;
use crate::readings;

use chrono::{DateTime, Utc};
use commands::{
    check_duplicate::CheckDuplicate, fetch_metadata::FetchMetadata,
    persist_message::PersistMessage, persist_readings::PersistReadings,
    set_receiving_data::SetReceivingData,
};

/// Why a message was dropped before any duplicate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Invalid(ParseError),
    NonData { channel: u32 },
    UnknownStation,
}

/// Where a message ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    DuplicateFound,
    MetadataFetchFailed,
    Persisted { message: MessageId, readings: usize },
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub messages: u64,
    pub invalid: u64,
    pub non_data: u64,
    pub unknown_station: u64,
    pub duplicates: u64,
    pub metadata_failures: u64,
    pub persisted: u64,
    pub readings: u64,
    pub latest_arrival: Option<DateTime<Utc>>,
}

impl BatchStats {
    fn record(&mut self, outcome: &Outcome) {
        self.messages += 1;
        match outcome {
            Outcome::Skipped(SkipReason::Invalid(_)) => self.invalid += 1,
            Outcome::Skipped(SkipReason::NonData { .. }) => self.non_data += 1,
            Outcome::Skipped(SkipReason::UnknownStation) => self.unknown_station += 1,
            Outcome::DuplicateFound => self.duplicates += 1,
            Outcome::MetadataFetchFailed => self.metadata_failures += 1,
            Outcome::Persisted { readings, .. } => {
                self.persisted += 1;
                self.readings += *readings as u64;
            }
        }
    }

    fn note_arrival(&mut self, arrival: DateTime<Utc>) {
        if self.latest_arrival.map_or(true, |latest| arrival > latest) {
            self.latest_arrival = Some(arrival);
        }
    }

    pub fn print_summary(&self) {
        info!("Batch Statistics:");
        info!("  Messages: {}", self.messages);
        info!("    Invalid: {}", self.invalid);
        info!("    Non-data: {}", self.non_data);
        info!("    Unknown station: {}", self.unknown_station);
        info!("    Duplicates: {}", self.duplicates);
        info!("    Metadata failures: {}", self.metadata_failures);
        info!("    Persisted: {}", self.persisted);
        info!("  Readings created: {}", self.readings);
        if let Some(latest) = self.latest_arrival {
            info!("  Latest arrival: {}", latest);
        }
    }
}

pub struct Coordinator {
    config: ConfigWrapper,
    api: Arc<dyn StorageApi>,
    archive: Option<MessageArchive>,
    pub stats: BatchStats,
}

impl Coordinator {
    pub fn new(config: ConfigWrapper, api: Arc<dyn StorageApi>) -> Self {
        Self {
            config,
            api,
            archive: None,
            stats: BatchStats::default(),
        }
    }

    pub fn with_archive(mut self, archive: MessageArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Ingests every message of `batch`, oldest first.
    ///
    /// Only a failure to persist a message or reading is returned; every
    /// other problem is contained to its message.
    pub async fn run_batch(&mut self, batch: &str) -> Result<()> {
        let messages = message::split(batch, self.config.message_delimiter());
        info!("processing {} messages", messages.len());

        SetReceivingData::new(self.api.as_ref(), true).run().await;

        let mut result = Ok(());
        for text in messages {
            match self.process_message(text).await {
                Ok(outcome) => self.stats.record(&outcome),
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }

        SetReceivingData::new(self.api.as_ref(), false).run().await;
        self.stats.print_summary();

        result
    }

    pub async fn process_message(&mut self, text: &str) -> Result<Outcome> {
        let header = match MessageHeader::parse(text, self.config.century_prefix()) {
            Ok(header) => header,
            Err(err) => {
                warn!("skipping unparseable message ({}): {}", err, text);
                return Ok(Outcome::Skipped(SkipReason::Invalid(err)));
            }
        };
        self.stats.note_arrival(header.arrival_time);

        if header.channel != self.config.data_channel() {
            info!("downloaded the following non-data message: {}", text);
            return Ok(Outcome::Skipped(SkipReason::NonData {
                channel: header.channel,
            }));
        }

        let Some(station) = self.config.station(&header.goes_id) else {
            warn!("no configuration for station {}, skipping: {}", header.goes_id, text);
            return Ok(Outcome::Skipped(SkipReason::UnknownStation));
        };

        let decoded = DecodedMessage::decode(
            header,
            text,
            self.config.bytes_per_value(),
            station.num_sensors(),
            station.readings_per_sensor(),
        );
        debug!("{:?}", decoded);

        if decoded.values.len() != station.expected_values() {
            warn!(
                "data quality: message from {} at {} decoded {} of {} expected values",
                decoded.header.goes_id,
                decoded.header.arrival_time,
                decoded.values.len(),
                station.expected_values()
            );
        }

        let api = self.api.as_ref();
        let header = &decoded.header;

        if CheckDuplicate::new(api, header, self.config.duplicate_window())
            .run()
            .await
        {
            return Ok(Outcome::DuplicateFound);
        }

        if let Some(archive) = &self.archive {
            if let Err(err) = archive.write(&decoded) {
                warn!("failed to archive message: {}", err);
            }
        }

        let metadata = match FetchMetadata::new(api, &header.goes_id, station).run().await {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(
                    "could not fetch metadata for {}, dropping message at {}: {}",
                    header.goes_id, header.arrival_time, err
                );
                return Ok(Outcome::MetadataFetchFailed);
            }
        };

        let message = PersistMessage::new(api, &decoded, self.config.retry_delay())
            .run()
            .await?;

        let slots = readings::synthesize(
            &decoded.values,
            station.num_sensors(),
            station.readings_per_sensor(),
            header.arrival_time,
            station.reading_interval(),
        );

        let readings =
            PersistReadings::new(api, &metadata, message, &slots, self.config.retry_delay())
                .run()
                .await?;

        info!(
            "saved message {} from {} at {} with {} readings",
            message, header.goes_id, header.arrival_time, readings
        );

        Ok(Outcome::Persisted { message, readings })
    }
}
