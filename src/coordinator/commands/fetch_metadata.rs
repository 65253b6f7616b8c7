use crate::prelude::*;
use crate::api::{SensorId, SensorLinkId, StationId};

/// Ids needed to attribute a reading to one of the station's sensors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorBinding {
    pub sensor: SensorId,
    pub link: SensorLinkId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StationMetadata {
    pub station: StationId,
    /// In the order the station lists them, which is payload order.
    pub sensors: Vec<SensorBinding>,
}

pub struct FetchMetadata<'a> {
    api: &'a dyn StorageApi,
    goes_id: &'a str,
    station: &'a config::Station,
}

impl<'a> FetchMetadata<'a> {
    pub fn new(api: &'a dyn StorageApi, goes_id: &'a str, station: &'a config::Station) -> Self {
        Self {
            api,
            goes_id,
            station,
        }
    }

    pub async fn run(&self) -> Result<StationMetadata> {
        let stations = self.api.find_stations(self.goes_id).await?;
        let station = match stations.as_slice() {
            [] => bail!("no station registered for {}", self.goes_id),
            [station] => station,
            [station, ..] => {
                warn!(
                    "{} stations registered for {}, using id {}",
                    stations.len(),
                    self.goes_id,
                    station.id
                );
                station
            }
        };

        let sensors = self.api.station_sensors(station.id).await?;
        if sensors.is_empty() {
            bail!("station {} ({}) has no sensors", station.id, self.goes_id);
        }

        let links = self.api.station_sensor_links(station.id, false).await?;

        let mut bindings = Vec::with_capacity(sensors.len());
        for sensor in &sensors {
            let link = links
                .iter()
                .find(|link| link.sensor.id() == sensor.id)
                .ok_or_else(|| {
                    anyhow!("sensor {} of station {} has no sensor link", sensor.id, station.id)
                })?;

            bindings.push(SensorBinding {
                sensor: sensor.id,
                link: link.id,
            });
        }

        if bindings.len() != self.station.num_sensors() {
            warn!(
                "data quality: station {} has {} sensors registered but {} configured",
                self.goes_id,
                bindings.len(),
                self.station.num_sensors()
            );
        }

        Ok(StationMetadata {
            station: station.id,
            sensors: bindings,
        })
    }
}
