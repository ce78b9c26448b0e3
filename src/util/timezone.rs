use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use time::{OffsetDateTime, UtcOffset};

/// UTC offset that `tz` observes at the given instant.
pub fn zone_offset(time: OffsetDateTime, tz: Tz) -> UtcOffset {
    let Some(utc) = DateTime::<Utc>::from_timestamp(time.unix_timestamp(), 0) else {
        return UtcOffset::UTC;
    };
    let seconds = tz
        .offset_from_utc_datetime(&utc.naive_utc())
        .fix()
        .local_minus_utc();
    UtcOffset::from_whole_seconds(seconds).unwrap_or(UtcOffset::UTC)
}

/// The same instant expressed in the wall-clock time of `tz`.
pub fn localized(time: OffsetDateTime, tz: Tz) -> OffsetDateTime {
    time.to_offset(zone_offset(time, tz))
}
