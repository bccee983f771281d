//! Timestamp parsing for encoder diagnostics

use std::time::Duration;

use crate::error::{ShrinkXError, ShrinkXResult};

/// Parse an encoder timestamp `HH:MM:SS.cc` into a centisecond-precision duration.
///
/// The fractional part may have any number of digits; anything past the
/// second digit is truncated.
pub fn parse_timestamp(text: &str) -> ShrinkXResult<Duration> {
    let invalid = || ShrinkXError::ProbeError {
        message: format!("Invalid timestamp: '{}'", text),
    };

    let mut parts = text.trim().split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let hours: u64 = hours.parse().map_err(|_| invalid())?;
    let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    let (whole, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
    let whole: u64 = whole.parse().map_err(|_| invalid())?;
    if whole >= 60 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let centis = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(2)
        .collect::<String>()
        .parse::<u64>()
        .map_err(|_| invalid())?;

    let total_millis = hours
        .checked_mul(3600)
        .and_then(|secs| secs.checked_add(minutes * 60 + whole))
        .and_then(|secs| secs.checked_mul(1000))
        .and_then(|millis| millis.checked_add(centis * 10))
        .ok_or_else(invalid)?;
    Ok(Duration::from_millis(total_millis))
}

/// Format a duration as `HH:MM:SS.cc`
pub fn format_timestamp(duration: Duration) -> String {
    let centis = duration.as_millis() / 10;
    let hours = centis / 360_000;
    let minutes = (centis / 6_000) % 60;
    let seconds = (centis / 100) % 60;
    format!("{:02}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis % 100)
}
