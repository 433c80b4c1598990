use serde::{Deserialize, Serialize};

/// Microseconds since the Unix epoch, stored as a big integer column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds.saturating_mul(1_000_000))
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}
