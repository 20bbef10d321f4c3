use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::LocalClock;
use crate::error::ClockError;

/// A remote writer's idea of the current time, bracketed by local clock reads.
///
/// `last_write` was read from the remote writer's clock at some real instant
/// between the local instants `read_after` and `read_before`. The all-zero
/// record (`SkewRecord::default()`) stands for a writer with no skew at all,
/// such as the local process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSkewRecord")]
pub struct SkewRecord {
    last_write: DateTime<Utc>,
    read_after: DateTime<Utc>,
    read_before: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawSkewRecord {
    last_write: DateTime<Utc>,
    read_after: DateTime<Utc>,
    read_before: DateTime<Utc>,
}

impl TryFrom<RawSkewRecord> for SkewRecord {
    type Error = ClockError;

    fn try_from(raw: RawSkewRecord) -> Result<Self, Self::Error> {
        SkewRecord::bracket(raw.read_after, raw.last_write, raw.read_before)
    }
}

impl SkewRecord {
    /// Build a record from one sample of the remote clock.
    pub fn bracket(
        read_after: DateTime<Utc>,
        last_write: DateTime<Utc>,
        read_before: DateTime<Utc>,
    ) -> Result<Self, ClockError> {
        if read_after > read_before {
            return Err(ClockError::InvertedBracket {
                read_after,
                read_before,
            });
        }
        Ok(Self {
            last_write,
            read_after,
            read_before,
        })
    }

    /// Sample a remote clock, reading the local clock immediately before and after.
    ///
    /// A local clock that steps backwards during the sample collapses the
    /// bracket onto `read_after` rather than inverting it.
    pub fn sample<C, E>(
        clock: &C,
        read_remote: impl FnOnce() -> Result<DateTime<Utc>, E>,
    ) -> Result<Self, E>
    where
        C: LocalClock + ?Sized,
    {
        let read_after = clock.now();
        let last_write = read_remote()?;
        let read_before = clock.now().max(read_after);
        Ok(Self {
            last_write,
            read_after,
            read_before,
        })
    }

    pub fn last_write(&self) -> DateTime<Utc> {
        self.last_write
    }

    pub fn read_after(&self) -> DateTime<Utc> {
        self.read_after
    }

    pub fn read_before(&self) -> DateTime<Utc> {
        self.read_before
    }

    /// The earliest local time at which the remote writer could agree that
    /// `remote` is in the past.
    pub fn earliest(&self, remote: DateTime<Utc>) -> DateTime<Utc> {
        if self.is_zero() {
            return remote;
        }
        shift(self.read_after, remote.signed_duration_since(self.last_write))
    }

    /// The latest local time by which the remote writer must agree that
    /// `remote` is in the past.
    pub fn latest(&self, remote: DateTime<Utc>) -> DateTime<Utc> {
        if self.is_zero() {
            return remote;
        }
        shift(self.read_before, remote.signed_duration_since(self.last_write))
    }

    /// True for the record of a perfectly synchronized writer.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

// Saturates at the representable range instead of panicking.
fn shift(base: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    base.checked_add_signed(delta).unwrap_or(if delta > TimeDelta::zero() {
        DateTime::<Utc>::MAX_UTC
    } else {
        DateTime::<Utc>::MIN_UTC
    })
}
