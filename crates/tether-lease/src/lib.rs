//! Tether Lease - Skew-aware timing for lease expiry decisions.
//!
//! A lease written by a remote writer carries timestamps from that writer's
//! clock. This crate turns those timestamps into local-time bounds that stay
//! safe however far the writer's clock is skewed from ours.

pub mod clock;
pub mod error;
pub mod skew;
pub mod tracker;

pub use clock::{Lease, LeaseClock, LocalClock, LocalLeaseView, ManualClock, SystemClock};
pub use error::ClockError;
pub use skew::SkewRecord;
pub use tracker::{SkewTracker, WriterId};
