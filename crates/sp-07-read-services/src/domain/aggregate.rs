//! Pure aggregation helpers behind the analytics queries.

use chrono::{DateTime, NaiveDate};
use shared_types::{TokenAmount, UnixTimestamp};
use std::collections::BTreeMap;

pub const SECONDS_PER_DAY: i64 = 86_400;

const BPS_SCALE: u64 = 10_000;

/// UTC calendar day of a unix timestamp.
pub fn utc_day(timestamp: UnixTimestamp) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

/// Sum amounts per UTC day, days ascending. Timestamps outside chrono's
/// range are ignored.
pub fn sum_by_day<I>(entries: I) -> Vec<(NaiveDate, TokenAmount)>
where
    I: IntoIterator<Item = (UnixTimestamp, TokenAmount)>,
{
    let mut days: BTreeMap<NaiveDate, TokenAmount> = BTreeMap::new();
    for (timestamp, amount) in entries {
        if let Some(day) = utc_day(timestamp) {
            let total = days.entry(day).or_default();
            *total = total.saturating_add(amount);
        }
    }
    days.into_iter().collect()
}

/// Running count of timestamps per UTC day, days ascending.
pub fn cumulative_by_day<I>(timestamps: I) -> Vec<(NaiveDate, usize)>
where
    I: IntoIterator<Item = UnixTimestamp>,
{
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for day in timestamps.into_iter().filter_map(utc_day) {
        *per_day.entry(day).or_default() += 1;
    }
    let mut running = 0;
    per_day
        .into_iter()
        .map(|(day, count)| {
            running += count;
            (day, running)
        })
        .collect()
}

/// `part / whole` in basis points, rounded down. Zero when `whole` is 0.
pub fn basis_points(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as u64).saturating_mul(BPS_SCALE) / whole as u64) as u32
}

/// Whole days from `now` until `due`, rounded up.
pub fn days_until(due: UnixTimestamp, now: UnixTimestamp) -> i64 {
    let diff = due.saturating_sub(now);
    -(-diff).div_euclid(SECONDS_PER_DAY)
}
