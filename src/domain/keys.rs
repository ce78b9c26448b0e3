//! Counter key naming and time bucketing.
//!
//! Keys are plain strings to the store; the namespaces below are the only
//! thing keeping them apart.
//!
//! | key                              | lifetime |
//! |----------------------------------|----------|
//! | `post:views:<slug>`              | forever  |
//! | `visits:total`                   | forever  |
//! | `visits:day:<YYYY-MM-DD>`        | 2 days   |
//! | `visits:hour:<YYYY-MM-DD>:<H>`   | 48 hours |
//! | `visits:unique:<YYYY-MM-DD>`     | 3 days   |

use chrono_tz::Tz;
use time::{
    Date, Duration, OffsetDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::util::timezone::localized;

const POST_VIEWS_PREFIX: &str = "post:views";
const VISITS_DAY_PREFIX: &str = "visits:day";
const VISITS_HOUR_PREFIX: &str = "visits:hour";
const VISITS_UNIQUE_PREFIX: &str = "visits:unique";

pub const VISITS_TOTAL_KEY: &str = "visits:total";

pub const DAY_BUCKET_TTL_SECS: u64 = 60 * 60 * 24 * 2;
pub const HOUR_BUCKET_TTL_SECS: u64 = 60 * 60 * 48;
pub const UNIQUE_SET_TTL_SECS: u64 = 60 * 60 * 24 * 3;

pub const STATS_DAY_WINDOW: usize = 7;
pub const STATS_HOUR_WINDOW: usize = 24;

const DAY_LABEL_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

pub fn post_views_key(slug: &str) -> String {
    format!("{POST_VIEWS_PREFIX}:{slug}")
}

/// A calendar day plus hour-of-day, already shifted into the site's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketInstant {
    pub date: Date,
    pub hour: u8,
}

impl BucketInstant {
    pub fn day_label(&self) -> String {
        day_label(self.date)
    }

    pub fn day_key(&self) -> String {
        day_key(self.date)
    }

    pub fn hour_key(&self) -> String {
        format!("{VISITS_HOUR_PREFIX}:{}:{}", self.day_label(), self.hour)
    }

    pub fn unique_key(&self) -> String {
        format!("{VISITS_UNIQUE_PREFIX}:{}", self.day_label())
    }
}

pub fn day_label(date: Date) -> String {
    date.format(DAY_LABEL_FORMAT).unwrap_or_else(|_| {
        format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        )
    })
}

pub fn day_key(date: Date) -> String {
    format!("{VISITS_DAY_PREFIX}:{}", day_label(date))
}

/// Maps wall-clock instants to bucket keys in a fixed time zone.
#[derive(Debug, Clone, Copy)]
pub struct Bucketing {
    tz: Tz,
}

impl Bucketing {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn instant(&self, now: OffsetDateTime) -> BucketInstant {
        let local = localized(now, self.tz);
        BucketInstant {
            date: local.date(),
            hour: local.hour(),
        }
    }

    /// Day keys for the last [`STATS_DAY_WINDOW`] days, oldest first, ending today.
    pub fn day_window(&self, now: OffsetDateTime) -> Vec<String> {
        let today = self.instant(now).date;
        let mut dates = Vec::with_capacity(STATS_DAY_WINDOW);
        let mut cursor = Some(today);
        while dates.len() < STATS_DAY_WINDOW {
            let Some(date) = cursor else { break };
            dates.push(date);
            cursor = date.previous_day();
        }
        dates.reverse();
        dates.into_iter().map(day_key).collect()
    }

    /// Hour keys for the last [`STATS_HOUR_WINDOW`] hours, oldest first, ending this hour.
    pub fn hour_window(&self, now: OffsetDateTime) -> Vec<String> {
        (0..STATS_HOUR_WINDOW as i64)
            .rev()
            .map(|back| self.instant(now - Duration::hours(back)).hour_key())
            .collect()
    }
}

impl Default for Bucketing {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}
