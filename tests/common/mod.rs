#![allow(dead_code)]

use goes_ingest::api::{
    MessageId, NewReading, ReadingId, Sensor, SensorLink, SensorRef, Station, StationId,
};
use goes_ingest::prelude::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub const STATION_A: &str = "CE4A2B3C";
pub const STATION_B: &str = "CE4A5D6E";

pub fn common_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Factory();
impl Factory {
    pub fn config() -> ConfigWrapper {
        Self::config_with("")
    }

    /// Two stations of two sensors with two readings each; no retry delay.
    pub fn config_with(extra: &str) -> ConfigWrapper {
        let yaml = format!(
            r#"
lrgs:
  host: lrgs.example.org
  port: 16003
  username: user
  password: secret
api:
  url: http://localhost:8000/api/
  username: user
  password: pass
ingest:
  retry_delay_secs: 0
stations:
  {}:
    sensors: [air_temp, stage]
    readings_per_sensor: 2
  {}:
    sensors: [air_temp, stage]
    readings_per_sensor: 2
{}"#,
            STATION_A, STATION_B, extra
        );

        ConfigWrapper::from_config(Config::from_str(&yaml).unwrap())
    }

    /// `time` is `YYDDDHHMMSS`.
    pub fn message(goes_id: &str, time: &str, channel: u32, data: &str) -> String {
        format!("{}{}G44+0NN{:03}EFF00040{}", goes_id, time, channel, data)
    }

    /// 2016-06-01 12:07:30 on the data channel, values 1, 2, 3, 4.
    pub fn data_message(goes_id: &str) -> String {
        Self::message(goes_id, "16153120730", 19, "B1A@@A@@B@@C@@D")
    }

    pub fn non_data_message(goes_id: &str) -> String {
        Self::message(goes_id, "16153120745", 20, " SATLINK DATA BUFFER EMPTY")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    FindMessages(String),
    CreateMessage(DecodedMessage),
    FindStations(String),
    StationSensors(StationId),
    StationSensorLinks(StationId),
    CreateReading(NewReading),
    SetReceivingData(bool),
}

struct RemoteStation {
    station: Station,
    sensors: Vec<Sensor>,
    links: Vec<SensorLink>,
}

/// In-memory stand-in for the storage service.
#[derive(Default)]
pub struct FakeApi {
    stations: Mutex<HashMap<String, RemoteStation>>,
    stored: Mutex<Vec<(String, DateTime<Utc>)>>,
    find_messages_error: Mutex<Option<ApiError>>,
    find_stations_error: Mutex<Option<ApiError>>,
    create_message_errors: Mutex<VecDeque<ApiError>>,
    create_reading_errors: Mutex<VecDeque<ApiError>>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<i64>,
}

impl FakeApi {
    /// Station `id` with sensors `id * 10 + n` linked by `id * 100 + n`.
    pub fn with_station(self, goes_id: &str, id: StationId, num_sensors: i64) -> Self {
        let sensors = (0..num_sensors)
            .map(|n| Sensor {
                id: id * 10 + n,
                name: None,
            })
            .collect();
        let links = (0..num_sensors)
            .map(|n| SensorLink {
                id: id * 100 + n,
                sensor: SensorRef::Id(id * 10 + n),
            })
            .collect();

        self.stations.lock().unwrap().insert(
            goes_id.to_string(),
            RemoteStation {
                station: Station {
                    id,
                    goes_id: Some(goes_id.to_string()),
                    name: None,
                },
                sensors,
                links,
            },
        );
        self
    }

    pub fn without_links(self, goes_id: &str) -> Self {
        if let Some(remote) = self.stations.lock().unwrap().get_mut(goes_id) {
            remote.links.clear();
        }
        self
    }

    pub fn failing_find_messages(self, err: ApiError) -> Self {
        *self.find_messages_error.lock().unwrap() = Some(err);
        self
    }

    pub fn failing_find_stations(self, err: ApiError) -> Self {
        *self.find_stations_error.lock().unwrap() = Some(err);
        self
    }

    pub fn failing_create_message(self, errors: Vec<ApiError>) -> Self {
        self.create_message_errors.lock().unwrap().extend(errors);
        self
    }

    pub fn failing_create_reading(self, errors: Vec<ApiError>) -> Self {
        self.create_reading_errors.lock().unwrap().extend(errors);
        self
    }

    pub fn already_stored(self, goes_id: &str, arrival: DateTime<Utc>) -> Self {
        self.stored.lock().unwrap().push((goes_id.to_string(), arrival));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_messages(&self) -> Vec<DecodedMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateMessage(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn created_readings(&self) -> Vec<NewReading> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateReading(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn receiving_data(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SetReceivingData(active) => Some(active),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_id(&self) -> i64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }
}

#[async_trait]
impl StorageApi for FakeApi {
    async fn find_messages(
        &self,
        goes_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        self.record(Call::FindMessages(goes_id.to_string()));
        if let Some(err) = self.find_messages_error.lock().unwrap().clone() {
            return Err(err);
        }

        Ok(self
            .stored
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, arrival)| id == goes_id && *arrival >= start && *arrival <= end)
            .map(|(id, arrival)| serde_json::json!({ "goes_id": id, "arrival_time": arrival }))
            .collect())
    }

    async fn create_message(&self, message: &DecodedMessage) -> Result<MessageId, ApiError> {
        self.record(Call::CreateMessage(message.clone()));
        if let Some(err) = self.create_message_errors.lock().unwrap().pop_front() {
            return Err(err);
        }

        self.stored
            .lock()
            .unwrap()
            .push((message.header.goes_id.clone(), message.header.arrival_time));
        Ok(self.next_id())
    }

    async fn find_stations(&self, goes_id: &str) -> Result<Vec<Station>, ApiError> {
        self.record(Call::FindStations(goes_id.to_string()));
        if let Some(err) = self.find_stations_error.lock().unwrap().clone() {
            return Err(err);
        }

        Ok(self
            .stations
            .lock()
            .unwrap()
            .get(goes_id)
            .map(|remote| vec![remote.station.clone()])
            .unwrap_or_default())
    }

    async fn station_sensors(&self, station: StationId) -> Result<Vec<Sensor>, ApiError> {
        self.record(Call::StationSensors(station));
        Ok(self
            .stations
            .lock()
            .unwrap()
            .values()
            .find(|remote| remote.station.id == station)
            .map(|remote| remote.sensors.clone())
            .unwrap_or_default())
    }

    async fn station_sensor_links(
        &self,
        station: StationId,
        _deep: bool,
    ) -> Result<Vec<SensorLink>, ApiError> {
        self.record(Call::StationSensorLinks(station));
        Ok(self
            .stations
            .lock()
            .unwrap()
            .values()
            .find(|remote| remote.station.id == station)
            .map(|remote| remote.links.clone())
            .unwrap_or_default())
    }

    async fn create_reading(&self, reading: &NewReading) -> Result<ReadingId, ApiError> {
        self.record(Call::CreateReading(reading.clone()));
        if let Some(err) = self.create_reading_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.next_id())
    }

    async fn set_receiving_data(&self, active: bool) -> Result<(), ApiError> {
        self.record(Call::SetReceivingData(active));
        Ok(())
    }
}

pub fn timeout() -> ApiError {
    ApiError::Timeout("operation timed out".to_string())
}

pub fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        url: "http://localhost:8000/api/messages/".to_string(),
    }
}
