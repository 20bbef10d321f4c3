use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::tracker::{SkewTracker, WriterId};

/// Source of local time.
pub trait LocalClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl LocalClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl LocalClock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// A lease as written by its holder's writer, in that writer's clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub name: String,
    pub holder: String,
    pub writer: WriterId,
    pub start: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

/// A lease's remote timestamps translated into local bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalLeaseView {
    pub earliest_start: DateTime<Utc>,
    pub latest_start: DateTime<Utc>,
    pub earliest_expiry: DateTime<Utc>,
    pub latest_expiry: DateTime<Utc>,
}

/// Answers lease-timing questions in local time, correcting for the skew of
/// whichever writer produced the lease.
pub struct LeaseClock<C: LocalClock = SystemClock> {
    tracker: Arc<SkewTracker>,
    clock: C,
}

impl LeaseClock<SystemClock> {
    pub fn new(tracker: Arc<SkewTracker>) -> Self {
        Self::with_clock(tracker, SystemClock)
    }
}

impl<C: LocalClock> LeaseClock<C> {
    pub fn with_clock(tracker: Arc<SkewTracker>, clock: C) -> Self {
        Self { tracker, clock }
    }

    pub fn tracker(&self) -> &Arc<SkewTracker> {
        &self.tracker
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn earliest(&self, writer: &WriterId, remote: DateTime<Utc>) -> DateTime<Utc> {
        self.tracker.skew(writer).earliest(remote)
    }

    pub fn latest(&self, writer: &WriterId, remote: DateTime<Utc>) -> DateTime<Utc> {
        self.tracker.skew(writer).latest(remote)
    }

    pub fn local_view(&self, lease: &Lease) -> LocalLeaseView {
        // One snapshot for all four bounds.
        let skew = self.tracker.skew(&lease.writer);
        LocalLeaseView {
            earliest_start: skew.earliest(lease.start),
            latest_start: skew.latest(lease.start),
            earliest_expiry: skew.earliest(lease.expiry),
            latest_expiry: skew.latest(lease.expiry),
        }
    }

    /// Whether an observer may now treat `lease` as expired. Uses the lower
    /// bound on the writer's expiry.
    pub fn may_consider_expired(&self, lease: &Lease) -> bool {
        self.clock.now() >= self.earliest(&lease.writer, lease.expiry)
    }

    /// The local instant by which the holder must have renewed `lease`. Uses
    /// the upper bound on the writer's expiry.
    pub fn renew_deadline(&self, lease: &Lease) -> DateTime<Utc> {
        self.latest(&lease.writer, lease.expiry)
    }

    /// Time left before `renew_deadline`, or zero once it has passed.
    pub fn time_to_renew(&self, lease: &Lease) -> TimeDelta {
        let left = self.renew_deadline(lease) - self.clock.now();
        left.max(TimeDelta::zero())
    }
}
