//! Capabilities the codec borrows from its environment: time and randomness.

/// Timestamp in microseconds from an arbitrary epoch.
/// Used for packet-number ledger timestamps and retention.
pub type Instant = u64;

/// Clock for ledger timestamps.
pub trait Clock {
    /// Current time in microseconds from an arbitrary epoch.
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Wall-clock time, microseconds since the Unix epoch.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }
}

/// Random bytes for Stateless Reset padding and unpredictable header bits.
///
/// Any cryptographic RNG source will do; tests use a deterministic counter.
pub trait Rng {
    /// Fill `buf` with random bytes.
    fn fill(&mut self, buf: &mut [u8]);
}

impl<R: Rng + ?Sized> Rng for &mut R {
    fn fill(&mut self, buf: &mut [u8]) {
        (**self).fill(buf)
    }
}
