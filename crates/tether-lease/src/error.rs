use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClockError {
    #[error("inverted clock sample: read after {read_after} but before {read_before}")]
    InvertedBracket {
        read_after: DateTime<Utc>,
        read_before: DateTime<Utc>,
    },
}
