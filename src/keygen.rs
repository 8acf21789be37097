
use chrono::{DateTime, Utc};

use crate::store::Key;

/// Number of hexadecimal characters kept from the digest.
pub const KEY_LENGTH: usize = 7;

/// Wall clock abstraction, injected so key generation can be pinned in tests.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The clock used outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Produces short hexadecimal keys by digesting a salt together with the
/// current time. The keys only need to tell measurement runs apart: two
/// calls with the same salt within the clock granularity yield the same
/// key, and no check against keys already held by a store is made here.
pub struct KeyGenerator {
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGenerator").finish_non_exhaustive()
    }
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self {
            clock: Box::new(SystemClock),
        }
    }
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self { clock }
    }
    /// One key from the given salt and the current clock reading.
    pub fn generate(&self, salt: &str) -> Key {
        let now = self.clock.now();
        let stamped = format!(
            "{}{}.{:09}",
            salt,
            now.timestamp(),
            now.timestamp_subsec_nanos()
        );
        let digest = blake3::hash(stamped.as_bytes());
        digest.to_hex()[..KEY_LENGTH].to_string()
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
