//! Spreads the flat list of decoded values over sensors and reading times.
//!
//! Transmissions carry no per-reading timestamps. Values are grouped per
//! sensor, most recent first, and the most recent one is taken to be logged
//! on the last interval boundary before the message arrived.

use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingSlot {
    /// Index into the station's ordered sensor list.
    pub sensor_index: usize,
    /// 0 is the most recent reading of the sensor.
    pub position: usize,
    pub read_time: DateTime<Utc>,
    pub value: Option<i64>,
}

/// The interval boundary at or before `arrival`, measured from the top of
/// the hour.
pub fn anchor_time(arrival: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let arrival = arrival
        .duration_trunc(Duration::seconds(1))
        .unwrap_or(arrival);

    let interval_secs = interval.num_seconds();
    if interval_secs <= 0 {
        return arrival;
    }

    let since_hour = i64::from(arrival.minute() * 60 + arrival.second());
    arrival - Duration::seconds(since_hour % interval_secs)
}

/// Chunk `i` of `readings_per_sensor` values belongs to sensor `i`.
///
/// Short input leaves later sensors with fewer or no slots; values beyond
/// the last sensor are dropped.
pub fn synthesize(
    values: &[Option<i64>],
    num_sensors: usize,
    readings_per_sensor: usize,
    arrival: DateTime<Utc>,
    interval: Duration,
) -> Vec<ReadingSlot> {
    if readings_per_sensor == 0 {
        return Vec::new();
    }

    let anchor = anchor_time(arrival, interval);

    values
        .chunks(readings_per_sensor)
        .take(num_sensors)
        .enumerate()
        .flat_map(|(sensor_index, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(move |(position, value)| ReadingSlot {
                    sensor_index,
                    position,
                    read_time: anchor - interval * position as i32,
                    value: *value,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 6, 1, h, m, s).unwrap()
    }

    fn quarter_hour() -> Duration {
        Duration::minutes(15)
    }

    #[test]
    fn anchors_to_preceding_quarter_hour() {
        assert_eq!(anchor_time(at(12, 7, 30), quarter_hour()), at(12, 0, 0));
        assert_eq!(anchor_time(at(12, 15, 0), quarter_hour()), at(12, 15, 0));
        assert_eq!(anchor_time(at(12, 59, 59), quarter_hour()), at(12, 45, 0));
    }

    #[test]
    fn anchor_drops_subsecond_precision() {
        let arrival = at(12, 30, 1) + Duration::milliseconds(250);
        assert_eq!(anchor_time(arrival, quarter_hour()), at(12, 30, 0));
    }

    #[test]
    fn anchor_follows_configured_interval() {
        assert_eq!(anchor_time(at(12, 7, 30), Duration::minutes(5)), at(12, 5, 0));
        assert_eq!(anchor_time(at(12, 7, 30), Duration::minutes(60)), at(12, 0, 0));
    }

    #[test]
    fn walks_backwards_from_anchor() {
        let values = [Some(1), Some(2), Some(3), Some(4)];
        let slots = synthesize(&values, 1, 4, at(12, 7, 30), quarter_hour());

        let times: Vec<_> = slots.iter().map(|s| s.read_time).collect();
        assert_eq!(
            times,
            vec![at(12, 0, 0), at(11, 45, 0), at(11, 30, 0), at(11, 15, 0)]
        );
    }

    #[test]
    fn chunks_values_per_sensor() {
        let values = [Some(1), Some(2), Some(3), None, Some(5), Some(6)];
        let slots = synthesize(&values, 3, 2, at(12, 7, 30), quarter_hour());

        assert_eq!(slots.len(), 6);
        assert_eq!(
            slots.iter().map(|s| (s.sensor_index, s.position, s.value)).collect::<Vec<_>>(),
            vec![
                (0, 0, Some(1)),
                (0, 1, Some(2)),
                (1, 0, Some(3)),
                (1, 1, None),
                (2, 0, Some(5)),
                (2, 1, Some(6)),
            ]
        );
        assert_eq!(slots[2].read_time, at(12, 0, 0));
        assert_eq!(slots[3].read_time, at(11, 45, 0));
    }

    #[test]
    fn short_input_leaves_later_sensors_empty() {
        let values = [Some(1), Some(2), Some(3)];
        let slots = synthesize(&values, 3, 2, at(12, 7, 30), quarter_hour());

        assert_eq!(slots.len(), 3);
        assert_eq!(slots[2].sensor_index, 1);
        assert!(slots.iter().all(|s| s.sensor_index < 2));
    }

    #[test]
    fn extra_values_are_dropped() {
        let values = [Some(1); 10];
        assert_eq!(synthesize(&values, 2, 4, at(12, 7, 30), quarter_hour()).len(), 8);
    }

    #[test]
    fn zero_readings_per_sensor_is_empty() {
        assert!(synthesize(&[Some(1)], 1, 0, at(12, 7, 30), quarter_hour()).is_empty());
    }
}
