// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixture helpers shared across the workspace's tests.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Build a UTC timestamp from calendar parts. Panics on invalid input, which
/// is fine in fixtures.
#[allow(clippy::unwrap_used)]
pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap(),
    )
}

/// Build a naive (server-local) timestamp from calendar parts.
#[allow(clippy::unwrap_used)]
pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
}

#[cfg(any(test, feature = "proptest"))]
pub mod strategies {
    use crate::mapping::Mapping;
    use proptest::prelude::*;

    /// Arbitrary mapping rows within small id ranges so collisions happen.
    pub fn mapping() -> impl Strategy<Value = Mapping> {
        (1i32..=5, 1i32..=50, "[A-Za-z0-9]{1,8}", any::<bool>()).prop_map(
            |(project_id, internal_id, external_key, primary)| Mapping {
                project_id,
                internal_id,
                external_key,
                primary,
            },
        )
    }
}
