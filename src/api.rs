use crate::prelude::*;

pub use crate::error::ApiError;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

pub type MessageId = i64;
pub type StationId = i64;
pub type SensorId = i64;
pub type SensorLinkId = i64;
pub type ReadingId = i64;

// wire types {{{
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Station {
    pub id: StationId,
    #[serde(default)]
    pub goes_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    #[serde(default)]
    pub name: Option<String>,
}

/// A link's sensor is an id, or the whole sensor when the listing is deep.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SensorRef {
    Id(SensorId),
    Expanded { id: SensorId },
}

impl SensorRef {
    pub fn id(&self) -> SensorId {
        match self {
            Self::Id(id) | Self::Expanded { id } => *id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SensorLink {
    pub id: SensorLinkId,
    pub sensor: SensorRef,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewReading {
    pub sensor: SensorId,
    pub station: StationId,
    pub station_sensor_link: SensorLinkId,
    #[serde(serialize_with = "rfc3339")]
    pub read_time: DateTime<Utc>,
    pub value: Option<i64>,
    pub message: MessageId,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

/// List endpoints answer with a bare array or a paginated object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Plain(v) | Self::Paged { results: v } => v,
        }
    }
}
// }}}

/// The remote station/message/reading store.
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Messages from `goes_id` that arrived within `[start, end]`.
    async fn find_messages(
        &self,
        goes_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<serde_json::Value>, ApiError>;

    async fn create_message(&self, message: &DecodedMessage) -> Result<MessageId, ApiError>;

    async fn find_stations(&self, goes_id: &str) -> Result<Vec<Station>, ApiError>;

    async fn station_sensors(&self, station: StationId) -> Result<Vec<Sensor>, ApiError>;

    async fn station_sensor_links(
        &self,
        station: StationId,
        deep: bool,
    ) -> Result<Vec<SensorLink>, ApiError>;

    async fn create_reading(&self, reading: &NewReading) -> Result<ReadingId, ApiError>;

    async fn set_receiving_data(&self, active: bool) -> Result<(), ApiError>;
}

/// [`StorageApi`] over HTTP with basic auth.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: Client,
    base: Url,
    username: String,
    password: String,
}

impl HttpApi {
    pub fn new(config: &config::Api) -> Result<Self> {
        // a base without a trailing slash would lose its last segment on join
        let mut url = config.url().to_string();
        if !url.ends_with('/') {
            url.push('/');
        }
        let base = Url::parse(&url)?;

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base,
            username: config.username().to_string(),
            password: config.password().to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self
            .base
            .join(path)
            .map_err(|err| ApiError::Transport(format!("bad path {}: {}", path, err)))?;

        trace!("{} {}", method, url);

        Ok(self
            .client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password)))
    }

    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }

    async fn list<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, ApiError> {
        let listing: Listing<T> = Self::send(request).await?.json().await?;
        Ok(listing.into_vec())
    }

    async fn create<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<i64, ApiError> {
        let request = self.request(Method::POST, path)?.json(body);
        let created: Created = Self::send(request).await?.json().await?;
        Ok(created.id)
    }
}

#[async_trait]
impl StorageApi for HttpApi {
    async fn find_messages(
        &self,
        goes_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        let request = self.request(Method::GET, "messages/")?.query(&[
            ("goes_id", goes_id.to_string()),
            ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ]);
        self.list(request).await
    }

    async fn create_message(&self, message: &DecodedMessage) -> Result<MessageId, ApiError> {
        self.create("messages/", message).await
    }

    async fn find_stations(&self, goes_id: &str) -> Result<Vec<Station>, ApiError> {
        let request = self
            .request(Method::GET, "stations/")?
            .query(&[("goes_id", goes_id)]);
        self.list(request).await
    }

    async fn station_sensors(&self, station: StationId) -> Result<Vec<Sensor>, ApiError> {
        let request = self.request(Method::GET, &format!("stations/{}/sensors/", station))?;
        self.list(request).await
    }

    async fn station_sensor_links(
        &self,
        station: StationId,
        deep: bool,
    ) -> Result<Vec<SensorLink>, ApiError> {
        let mut request =
            self.request(Method::GET, &format!("stations/{}/sensor-links/", station))?;
        if deep {
            request = request.query(&[("deep", "true")]);
        }
        self.list(request).await
    }

    async fn create_reading(&self, reading: &NewReading) -> Result<ReadingId, ApiError> {
        self.create("readings/", reading).await
    }

    async fn set_receiving_data(&self, active: bool) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, "settings/receiving_data/")?
            .json(&serde_json::json!({ "value": active }));
        Self::send(request).await?;
        Ok(())
    }
}

fn rfc3339<S: serde::Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Secs, true))
}
