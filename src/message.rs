use crate::error::ParseError;
use crate::pseudobinary;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use nom::{
    bytes::complete::{take, take_while_m_n},
    combinator::{all_consuming, map_res},
    sequence::tuple,
    IResult,
};
use serde::{Serialize, Serializer};

/// Length of the fixed-width DOMSAT header in front of every message.
pub const HEADER_LENGTH: usize = 37;

/// Splits a retrieval batch into trimmed messages, oldest first.
///
/// The retrieval client writes the newest message first.
pub fn split<'a>(batch: &'a str, delimiter: &str) -> Vec<&'a str> {
    let mut messages: Vec<&str> = batch
        .split(delimiter)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .collect();
    messages.reverse();
    messages
}

// MessageHeader {{{
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageHeader {
    pub goes_id: String,
    #[serde(serialize_with = "iso8601")]
    pub arrival_time: DateTime<Utc>,
    pub failure_code: String,
    pub signal_strength: u32,
    pub frequency_offset: String,
    pub modulation_index: String,
    pub data_quality: String,
    #[serde(rename = "goes_channel")]
    pub channel: u32,
    pub spacecraft: String,
    pub data_source: String,
    #[serde(rename = "recorded_message_length")]
    pub recorded_length: u32,
}

impl MessageHeader {
    /// Parses the first [`HEADER_LENGTH`] characters of `text`.
    ///
    /// The arrival time field is `YYDDDHHMMSS`; `century_prefix` supplies the
    /// missing leading digits of the year.
    pub fn parse(text: &str, century_prefix: &str) -> Result<Self, ParseError> {
        let len = text.chars().count();
        if len < HEADER_LENGTH {
            return Err(ParseError::TooShort {
                len,
                needed: HEADER_LENGTH,
            });
        }

        let (_, fields) = header_fields(text).map_err(|_| ParseError::TooShort {
            len,
            needed: HEADER_LENGTH,
        })?;

        let time = format!("{}{}", century_prefix, fields.time);
        let arrival_time = parse_arrival_time(&time)
            .ok_or_else(|| ParseError::InvalidTimestamp(time.clone()))?;

        Ok(Self {
            goes_id: fields.goes_id.to_string(),
            arrival_time,
            failure_code: fields.failure_code.to_string(),
            signal_strength: parse_int("signal_strength", fields.signal_strength)?,
            frequency_offset: fields.frequency_offset.to_string(),
            modulation_index: fields.modulation_index.to_string(),
            data_quality: fields.data_quality.to_string(),
            channel: parse_int("channel", fields.channel)?,
            spacecraft: fields.spacecraft.to_string(),
            data_source: fields.data_source.to_string(),
            recorded_length: parse_int("recorded_length", fields.recorded_length)?,
        })
    }
} // }}}

struct HeaderFields<'a> {
    goes_id: &'a str,
    time: &'a str,
    failure_code: &'a str,
    signal_strength: &'a str,
    frequency_offset: &'a str,
    modulation_index: &'a str,
    data_quality: &'a str,
    channel: &'a str,
    spacecraft: &'a str,
    data_source: &'a str,
    recorded_length: &'a str,
}

fn header_fields(input: &str) -> IResult<&str, HeaderFields<'_>> {
    let (rest, fields) = tuple((
        take(8usize),
        take(11usize),
        take(1usize),
        take(2usize),
        take(2usize),
        take(1usize),
        take(1usize),
        take(3usize),
        take(1usize),
        take(2usize),
        take(5usize),
    ))(input)?;

    let (
        goes_id,
        time,
        failure_code,
        signal_strength,
        frequency_offset,
        modulation_index,
        data_quality,
        channel,
        spacecraft,
        data_source,
        recorded_length,
    ) = fields;

    Ok((
        rest,
        HeaderFields {
            goes_id,
            time,
            failure_code,
            signal_strength,
            frequency_offset,
            modulation_index,
            data_quality,
            channel,
            spacecraft,
            data_source,
            recorded_length,
        },
    ))
}

fn digits<'a>(count: usize) -> impl FnMut(&'a str) -> IResult<&'a str, u32> {
    map_res(
        take_while_m_n(count, count, |c: char| c.is_ascii_digit()),
        str::parse::<u32>,
    )
}

/// `YYYYDDDHHMMSS`, UTC.
fn parse_arrival_time(text: &str) -> Option<DateTime<Utc>> {
    let (_, (year, ordinal, hour, minute, second)) =
        all_consuming(tuple((digits(4), digits(3), digits(2), digits(2), digits(2))))(text)
            .ok()?;

    let date = NaiveDate::from_yo_opt(year as i32, ordinal)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;

    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

fn parse_int(field: &'static str, value: &str) -> Result<u32, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidField {
        field,
        value: value.to_string(),
    })
}

fn iso8601<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
}

// DecodedMessage {{{
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub values: Vec<Option<i64>>,
    pub message_text: String,
}

impl DecodedMessage {
    /// Decodes the data block that follows the header of `text`.
    pub fn decode(
        header: MessageHeader,
        text: &str,
        bytes_per_value: usize,
        num_sensors: usize,
        num_readings: usize,
    ) -> Self {
        let values = pseudobinary::decode(
            data_block(text),
            bytes_per_value,
            num_sensors,
            num_readings,
        );

        Self {
            header,
            values,
            message_text: text.to_string(),
        }
    }
} // }}}

/// Everything after the header.
pub fn data_block(text: &str) -> &str {
    match text.char_indices().nth(HEADER_LENGTH) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}
