//! Protocol timestamps.
//!
//! A [`DateTime`] counts 100-nanosecond ticks since 1601-01-01 UTC. Values are
//! produced through the [`Clock`] trait so that anything stamping a timestamp
//! can be driven by a [`FixedClock`] in tests.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::encoding::{BinaryDecode, BinaryEncode};
use crate::error::Result;

/// Seconds between 1601-01-01 and 1970-01-01.
pub const EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// 100-nanosecond ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

const NANOS_PER_TICK: u32 = 100;

/// Timestamp in 100 ns ticks since 1601-01-01 UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateTime(pub i64);

impl DateTime {
    /// Tick value of the Unix epoch.
    pub const UNIX_EPOCH: DateTime = DateTime(EPOCH_OFFSET_SECS * TICKS_PER_SECOND);

    /// Read the system wall clock.
    pub fn now() -> Self {
        SystemClock.now()
    }

    /// Convert a wall-clock reading, including readings before 1970.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self(Self::UNIX_EPOCH.0.saturating_add(duration_ticks(after))),
            Err(err) => Self(Self::UNIX_EPOCH.0.saturating_sub(duration_ticks(err.duration()))),
        }
    }

    /// Convert back to a wall-clock value.
    pub fn to_system_time(self) -> SystemTime {
        let offset = self.0.saturating_sub(Self::UNIX_EPOCH.0);
        let magnitude = ticks_duration(offset.unsigned_abs());
        if offset >= 0 {
            UNIX_EPOCH + magnitude
        } else {
            UNIX_EPOCH - magnitude
        }
    }

    pub fn ticks(self) -> i64 {
        self.0
    }
}

fn duration_ticks(duration: Duration) -> i64 {
    let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
    secs.saturating_mul(TICKS_PER_SECOND)
        .saturating_add(i64::from(duration.subsec_nanos() / NANOS_PER_TICK))
}

fn ticks_duration(ticks: u64) -> Duration {
    let per_second = TICKS_PER_SECOND as u64;
    Duration::new(
        ticks / per_second,
        (ticks % per_second) as u32 * NANOS_PER_TICK,
    )
}

impl BinaryEncode for DateTime {
    fn byte_len(&self) -> usize {
        8
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.0.encode(buf)
    }
}

impl BinaryDecode for DateTime {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        i64::decode(buf).map(DateTime)
    }
}

/// Source of protocol timestamps.
pub trait Clock {
    fn now(&self) -> DateTime;
}

/// The system wall clock. Holds no state between readings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        DateTime::from_system_time(SystemTime::now())
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime);

impl FixedClock {
    /// Frozen at the given wall-clock time.
    pub fn at(time: SystemTime) -> Self {
        Self(DateTime::from_system_time(time))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime {
        self.0
    }
}
