//! Pseudobinary payload decoding.
//!
//! A data block is a run of printable characters, each carrying six bits
//! (`char - 64`). Values are fixed-width groups of characters, big-endian,
//! two's complement over the full group width.

/// Marks the start of the block; the group id and time offset follow it.
const BLOCK_MARKER: char = 'B';

/// Sent by the transmitter when it had nothing logged.
pub const DATA_BUFFER_EMPTY: &str = "SATLINK DATA BUFFER EMPTY";

/// A window made entirely of this character carries no value.
const BLANK: char = '/';

const DIGIT_OFFSET: i64 = 64;

/// `?` decodes to -1; by convention it stands in for DEL (127), i.e. 63.
const DEL_DIGIT: i64 = -1;
const MAX_DIGIT: i64 = 63;

/// The two informational characters after the block marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub group_id: char,
    pub time_offset: i64,
}

/// Returns the group id and time offset of the block, if the payload has one.
pub fn block_header(payload: &str) -> Option<BlockHeader> {
    let mut chars = payload.chars().skip_while(|c| *c != BLOCK_MARKER).skip(1);
    let group_id = chars.next()?;
    let time_offset = chars.next()? as i64 - DIGIT_OFFSET;

    Some(BlockHeader {
        group_id,
        time_offset,
    })
}

/// Decodes up to `num_sensors * num_readings` values of `bytes_per_value`
/// characters each.
///
/// Never fails: blank or malformed windows become `None`, and a transmission
/// that ends early simply yields fewer values.
pub fn decode(
    payload: &str,
    bytes_per_value: usize,
    num_sensors: usize,
    num_readings: usize,
) -> Vec<Option<i64>> {
    if payload.contains(DATA_BUFFER_EMPTY) || bytes_per_value == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = payload.chars().collect();
    let Some(marker) = chars.iter().position(|c| *c == BLOCK_MARKER) else {
        return Vec::new();
    };

    let start = marker + 3;
    let end = start.saturating_add(
        num_sensors
            .saturating_mul(bytes_per_value)
            .saturating_mul(num_readings),
    );

    let mut values = Vec::new();
    let mut offset = start;

    while offset < end && offset < chars.len() {
        let window_end = (offset + bytes_per_value).min(chars.len());
        values.push(decode_window(&chars[offset..window_end], bytes_per_value));
        offset += bytes_per_value;
    }

    values
}

/// Decodes one group of characters. A short final window is assembled with
/// its own length but sign-corrected against the configured width.
fn decode_window(window: &[char], bytes_per_value: usize) -> Option<i64> {
    if is_blank(window) {
        return None;
    }

    let mut digits = Vec::with_capacity(window.len());
    for c in window {
        let digit = *c as i64 - DIGIT_OFFSET;
        if !(DEL_DIGIT..=MAX_DIGIT).contains(&digit) {
            return None;
        }
        digits.push(if digit == DEL_DIGIT { MAX_DIGIT } else { digit });
    }

    let value = digits.iter().fold(0i64, |acc, digit| (acc << 6) | digit);

    // widths beyond 10 characters do not fit an i64
    let bits = (6 * bytes_per_value).min(62) as u32;
    let modulus = 1i64 << bits;
    if value > (modulus >> 1) - 1 {
        Some(value - modulus)
    } else {
        Some(value)
    }
}

fn is_blank(window: &[char]) -> bool {
    !window.is_empty() && window.iter().all(|c| *c == BLANK)
}
