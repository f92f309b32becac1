//! Monotonic time stamps.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::{Add, AddAssign, Sub};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static ORIGIN: OnceLock<Instant> = OnceLock::new();

/// A point on a monotonic clock, measured from a process-wide origin.
///
/// Serialized as an integer count of nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbsoluteTime(Duration);

impl AbsoluteTime {
    pub const ZERO: AbsoluteTime = AbsoluteTime(Duration::ZERO);

    /// The current instant.
    pub fn now() -> Self {
        let origin = *ORIGIN.get_or_init(Instant::now);
        AbsoluteTime(origin.elapsed())
    }

    pub const fn from_duration(since_origin: Duration) -> Self {
        AbsoluteTime(since_origin)
    }

    pub const fn from_millis(millis: u64) -> Self {
        AbsoluteTime(Duration::from_millis(millis))
    }

    pub const fn from_nanos(nanos: u64) -> Self {
        AbsoluteTime(Duration::from_nanos(nanos))
    }

    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_nanos(&self) -> u64 {
        u64::try_from(self.0.as_nanos()).unwrap_or(u64::MAX)
    }
}

impl Add<Duration> for AbsoluteTime {
    type Output = AbsoluteTime;

    fn add(self, rhs: Duration) -> AbsoluteTime {
        AbsoluteTime(self.0.saturating_add(rhs))
    }
}

impl AddAssign<Duration> for AbsoluteTime {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 = self.0.saturating_add(rhs);
    }
}

/// Elapsed time between two instants, zero if `rhs` is later.
impl Sub for AbsoluteTime {
    type Output = Duration;

    fn sub(self, rhs: AbsoluteTime) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Serialize for AbsoluteTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.as_nanos())
    }
}

impl<'de> Deserialize<'de> for AbsoluteTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(AbsoluteTime::from_nanos)
    }
}

/// Serde helper for `Duration` fields stored as integer nanoseconds.
pub(crate) mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}
