use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::skew::SkewRecord;

/// Identity of a process that writes lease documents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WriterId(pub String);

impl WriterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for WriterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Most recent clock-skew observation for each remote writer.
///
/// Records are only ever swapped as whole values, so a reader always sees
/// one complete sample.
#[derive(Debug, Default)]
pub struct SkewTracker {
    records: DashMap<WriterId, SkewRecord>,
}

impl SkewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh observation for `writer`.
    ///
    /// A sample whose bracket started earlier than the one already held is
    /// stale and ignored. Returns whether the record was replaced.
    pub fn observe(&self, writer: WriterId, record: SkewRecord) -> bool {
        match self.records.entry(writer) {
            Entry::Occupied(mut entry) => {
                let current = *entry.get();
                if !current.is_zero() && record.read_after() < current.read_after() {
                    tracing::warn!(
                        writer = %entry.key(),
                        held = %current.read_after(),
                        offered = %record.read_after(),
                        "ignoring stale skew sample"
                    );
                    return false;
                }
                tracing::debug!(writer = %entry.key(), last_write = %record.last_write(), "skew observed");
                entry.insert(record);
            }
            Entry::Vacant(entry) => {
                tracing::debug!(writer = %entry.key(), last_write = %record.last_write(), "skew observed");
                entry.insert(record);
            }
        }
        true
    }

    /// Mark `writer` as sharing our clock.
    pub fn set_local(&self, writer: WriterId) {
        self.records.insert(writer, SkewRecord::default());
    }

    /// The held record for `writer`, if any.
    pub fn get(&self, writer: &WriterId) -> Option<SkewRecord> {
        self.records.get(writer).map(|record| *record)
    }

    /// The held record for `writer`, or the zero record when none is held.
    pub fn skew(&self, writer: &WriterId) -> SkewRecord {
        self.get(writer).unwrap_or_default()
    }

    /// Discard the record for `writer`, e.g. when its lease goes away.
    pub fn forget(&self, writer: &WriterId) -> Option<SkewRecord> {
        self.records.remove(writer).map(|(_, record)| record)
    }

    pub fn writers(&self) -> Vec<WriterId> {
        let mut writers: Vec<_> = self.records.iter().map(|e| e.key().clone()).collect();
        writers.sort();
        writers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_433_160_000 + secs, 0).unwrap()
    }

    fn bracketed(after: i64, remote: i64, before: i64) -> SkewRecord {
        SkewRecord::bracket(at(after), at(remote), at(before)).unwrap()
    }

    #[test]
    fn test_unknown_writer_is_unskewed() {
        let tracker = SkewTracker::new();
        let writer = WriterId::new("machine-0");

        assert!(tracker.get(&writer).is_none());
        assert!(tracker.skew(&writer).is_zero());
    }

    #[test]
    fn test_fresher_sample_replaces_record() {
        let tracker = SkewTracker::new();
        let writer = WriterId::new("machine-1");

        assert!(tracker.observe(writer.clone(), bracketed(0, 100, 1)));
        assert!(tracker.observe(writer.clone(), bracketed(10, 110, 12)));

        let held = tracker.skew(&writer);
        assert_eq!(held.read_after(), at(10));
        assert_eq!(held.read_before(), at(12));
    }

    #[test]
    fn test_stale_sample_ignored() {
        let tracker = SkewTracker::new();
        let writer = WriterId::new("machine-1");

        tracker.observe(writer.clone(), bracketed(10, 110, 12));
        assert!(!tracker.observe(writer.clone(), bracketed(0, 100, 1)));
        assert_eq!(tracker.skew(&writer).last_write(), at(110));
    }

    #[test]
    fn test_local_writer_then_remote_sample() {
        let tracker = SkewTracker::new();
        let writer = WriterId::new("machine-2");

        tracker.set_local(writer.clone());
        assert!(tracker.skew(&writer).is_zero());

        assert!(tracker.observe(writer.clone(), bracketed(0, 0, 1)));
        assert!(!tracker.skew(&writer).is_zero());
    }

    #[test]
    fn test_forget() {
        let tracker = SkewTracker::new();
        let writer = WriterId::new("machine-3");

        tracker.observe(writer.clone(), bracketed(0, 5, 1));
        assert!(tracker.forget(&writer).is_some());
        assert!(tracker.get(&writer).is_none());
        assert!(tracker.writers().is_empty());
    }

    #[test]
    fn test_concurrent_readers_see_whole_records() {
        let tracker = std::sync::Arc::new(SkewTracker::new());
        let writer = WriterId::new("machine-4");

        std::thread::scope(|s| {
            let w = writer.clone();
            let t = tracker.clone();
            s.spawn(move || {
                for i in 0..200 {
                    t.observe(w.clone(), bracketed(i, i + 1000, i + 1));
                }
            });
            for _ in 0..200 {
                let held = tracker.skew(&writer);
                if !held.is_zero() {
                    let delta = held.last_write() - held.read_after();
                    assert_eq!(delta, TimeDelta::seconds(1000));
                    assert_eq!(held.read_before() - held.read_after(), TimeDelta::seconds(1));
                }
            }
        });
    }

    #[test]
    fn test_racing_observers_keep_freshest_sample() {
        let tracker = SkewTracker::new();
        let writer = WriterId::new("machine-5");

        std::thread::scope(|s| {
            for t in 0..4 {
                let tracker = &tracker;
                let writer = writer.clone();
                s.spawn(move || {
                    // Each thread walks the samples in a different order.
                    for i in 0..100 {
                        let n = (i * 7 + t * 13) % 100;
                        tracker.observe(writer.clone(), bracketed(n, n + 50, n + 1));
                    }
                });
            }
        });

        let held = tracker.skew(&writer);
        assert_eq!(held.read_after(), at(99));
        assert_eq!(held.last_write(), at(149));
    }
}
