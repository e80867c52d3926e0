// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watermark sentinel and local↔UTC conversion.
//!
//! The internal service stores UTC; the external service stores server-local
//! timestamps. `time_offset_hours` is the configured hour difference between
//! external local time and UTC (negative for zones behind UTC), so
//! `utc = local - offset` and `local = utc + offset`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Watermark used when the host has no last-successful-run timestamp yet.
pub fn first_run_watermark() -> DateTime<Utc> {
    // Far-past sentinel; discovery queries clamp via the query-cap fallback.
    match NaiveDate::from_ymd_opt(1950, 1, 1) {
        Some(d) => Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap_or_default()),
        None => DateTime::UNIX_EPOCH,
    }
}

/// Convert an external server-local timestamp to UTC.
pub fn wits_local_to_utc(local: NaiveDateTime, offset_hours: i32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(local - Duration::hours(offset_hours as i64)))
}

/// Convert a UTC timestamp to external server-local time.
pub fn utc_to_wits_local(utc: DateTime<Utc>, offset_hours: i32) -> NaiveDateTime {
    utc.naive_utc() + Duration::hours(offset_hours as i64)
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod tests;
