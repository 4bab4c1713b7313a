// Adapters layer: one module per on-disk format, plus the compression codecs.

pub mod ar;
pub mod codec;
pub mod cpio;
pub mod sevenz;
pub mod tar;
pub mod walk;
pub mod zip;

use chrono::{DateTime, Utc};

pub(crate) fn unix_seconds(time: Option<DateTime<Utc>>) -> u64 {
    time.map(|t| t.timestamp().max(0) as u64).unwrap_or(0)
}

pub(crate) fn from_unix_seconds(seconds: u64) -> Option<DateTime<Utc>> {
    if seconds == 0 {
        return None;
    }
    DateTime::from_timestamp(i64::try_from(seconds).ok()?, 0)
}
