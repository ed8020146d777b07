// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for wire/storage timestamp conversion.

use chrono::{DateTime, NaiveDate, Timelike, Utc};

/// Convert a second-precision storage timestamp to wire milliseconds.
///
/// Returns `None` if the result does not fit in an `i64`.
pub fn secs_to_millis(secs: i64) -> Option<i64> {
    secs.checked_mul(1000)
}

/// Convert wire milliseconds back to second-precision storage.
pub fn millis_to_secs(millis: i64) -> i64 {
    millis / 1000
}

/// Interpret epoch milliseconds as a UTC timestamp.
pub fn utc_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Whether epoch milliseconds fall exactly on 00:00:00 UTC.
///
/// Only hour, minute and second are checked; sub-second residue is
/// discarded when the date is stored.
pub fn is_utc_midnight(millis: i64) -> bool {
    match utc_from_millis(millis) {
        Some(dt) => dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0,
        None => false,
    }
}

/// Epoch seconds of midnight UTC on the given day.
pub fn midnight_secs(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}
