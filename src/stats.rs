// Derived statistics over the record list

use crate::profile::DatasetProfile;
use crate::record::Record;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Window for the "this week" count
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Counts shown on the dashboard header.
///
/// Always computed from scratch with [`Stats::compute`]; never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    /// Count per status bucket key, e.g. `draft`
    pub buckets: BTreeMap<String, usize>,
    pub this_week: usize,
}

impl Stats {
    pub fn compute(records: &[Record], profile: &DatasetProfile, now: DateTime<Utc>) -> Self {
        let buckets = profile
            .buckets()
            .map(|(key, value)| {
                let count = records
                    .iter()
                    .filter(|r| r.get_str(&profile.status_field) == Some(value))
                    .count();
                (key.to_string(), count)
            })
            .collect();

        let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
        let this_week = records
            .iter()
            .filter_map(|r| r.get(&profile.date_field).and_then(|v| v.as_datetime()))
            .filter(|date| *date >= cutoff)
            .count();

        Self {
            total: records.len(),
            buckets,
            this_week,
        }
    }

    /// Count for a bucket key; zero for unknown keys
    pub fn count(&self, bucket: &str) -> usize {
        self.buckets.get(bucket).copied().unwrap_or(0)
    }
}
