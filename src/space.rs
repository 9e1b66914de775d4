//! Per-space packet number allocation and bookkeeping (RFC 9000 section 12.3).
//!
//! Each of the three spaces hands out packet numbers independently and keeps
//! a ledger of what it sent and received. Loss detection here is the simple
//! reordering-threshold rule only; timers and RTT live with the connection.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::config::{CodecConfig, DefaultConfig};
use crate::error::Error;
use crate::packet::number::{self, MAX_PACKET_NUMBER};
use crate::transport::{Clock, Instant};

/// The three packet number spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpaceId {
    Initial,
    Handshake,
    /// Shared by 0-RTT and 1-RTT packets.
    Application,
}

impl SpaceId {
    pub const fn name(self) -> &'static str {
        match self {
            SpaceId::Initial => "Initial",
            SpaceId::Handshake => "Handshake",
            SpaceId::Application => "Application",
        }
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sent-ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentPacket {
    pub sent_time: Instant,
    pub acked: bool,
    /// Time of the first acknowledgement.
    pub ack_time: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedPacket {
    pub received_time: Instant,
}

/// Point-in-time counters for a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceStats {
    pub space: SpaceId,
    pub next_packet_number: u64,
    pub largest_sent: Option<u64>,
    pub largest_received: Option<u64>,
    pub sent_packets: usize,
    pub received_packets: usize,
    pub acked_packets: usize,
    pub unacked_packets: usize,
}

/// Packet number state for one space.
///
/// Single writer: wrap in a lock if a space must be shared between threads.
pub struct PacketNumberSpace<K: Clock, C: CodecConfig = DefaultConfig> {
    space: SpaceId,
    clock: K,
    next_packet_number: u64,
    largest_sent: Option<u64>,
    largest_received: Option<u64>,
    sent: BTreeMap<u64, SentPacket>,
    received: BTreeMap<u64, ReceivedPacket>,
    _config: PhantomData<C>,
}

impl<K: Clock, C: CodecConfig> PacketNumberSpace<K, C> {
    pub fn new(space: SpaceId, clock: K) -> Self {
        Self {
            space,
            clock,
            next_packet_number: 0,
            largest_sent: None,
            largest_received: None,
            sent: BTreeMap::new(),
            received: BTreeMap::new(),
            _config: PhantomData,
        }
    }

    /// Space whose first allocated number is `first`, for endpoints that
    /// start from a random packet number.
    pub fn with_first_packet_number(space: SpaceId, clock: K, first: u64) -> Result<Self, Error> {
        if first > MAX_PACKET_NUMBER {
            return Err(Error::InvalidPacketNumber(first));
        }
        let mut this = Self::new(space, clock);
        this.next_packet_number = first;
        Ok(this)
    }

    pub fn space(&self) -> SpaceId {
        self.space
    }

    /// The number the next [`get_next`](Self::get_next) call returns.
    pub fn next_packet_number(&self) -> u64 {
        self.next_packet_number
    }

    pub fn largest_sent(&self) -> Option<u64> {
        self.largest_sent
    }

    pub fn largest_received(&self) -> Option<u64> {
        self.largest_received
    }

    /// Largest sent packet number that has been acknowledged.
    pub fn largest_acked(&self) -> Option<u64> {
        self.sent
            .iter()
            .rev()
            .find(|(_, p)| p.acked)
            .map(|(&pn, _)| pn)
    }

    pub fn sent_packet(&self, pn: u64) -> Option<&SentPacket> {
        self.sent.get(&pn)
    }

    pub fn received_packet(&self, pn: u64) -> Option<&ReceivedPacket> {
        self.received.get(&pn)
    }

    /// Allocate the next packet number and record it as sent, unacked.
    ///
    /// Numbers are never reused. Once 2^62 - 1 has been handed out the space
    /// is exhausted and every further call fails without changing state.
    pub fn get_next(&mut self) -> Result<u64, Error> {
        let pn = self.next_packet_number;
        if pn > MAX_PACKET_NUMBER {
            tracing::debug!(space = %self.space, pn, "packet number space exhausted");
            return Err(Error::InvalidPacketNumber(pn));
        }
        self.next_packet_number += 1;
        self.largest_sent = Some(self.largest_sent.map_or(pn, |l| l.max(pn)));
        self.sent.insert(
            pn,
            SentPacket {
                sent_time: self.clock.now(),
                acked: false,
                ack_time: None,
            },
        );
        tracing::trace!(space = %self.space, pn, "allocated packet number");
        Ok(pn)
    }

    /// In range and not already received.
    pub fn is_valid(&self, pn: u64) -> bool {
        pn <= MAX_PACKET_NUMBER && !self.received.contains_key(&pn)
    }

    pub fn record_received(&mut self, pn: u64) -> Result<(), Error> {
        if !self.is_valid(pn) {
            tracing::debug!(space = %self.space, pn, "rejecting packet number");
            return Err(Error::InvalidPacketNumber(pn));
        }
        self.received.insert(
            pn,
            ReceivedPacket {
                received_time: self.clock.now(),
            },
        );
        self.largest_received = Some(self.largest_received.map_or(pn, |l| l.max(pn)));
        Ok(())
    }

    /// Mark `pn` acknowledged. Numbers this space never sent are ignored.
    pub fn acknowledge(&mut self, pn: u64) {
        let now = self.clock.now();
        if let Some(p) = self.sent.get_mut(&pn) {
            if !p.acked {
                p.acked = true;
                p.ack_time = Some(now);
            }
        }
    }

    /// Sent packet numbers still awaiting acknowledgement, ascending.
    pub fn get_unacknowledged(&self) -> Vec<u64> {
        self.sent
            .iter()
            .filter(|(_, p)| !p.acked)
            .map(|(&pn, _)| pn)
            .collect()
    }

    /// Unacked packets more than `threshold` below the largest acknowledged
    /// packet number, ascending. Empty until something is acked.
    pub fn detect_loss(&self, threshold: u64) -> Vec<u64> {
        let Some(limit) = self
            .largest_acked()
            .and_then(|largest| largest.checked_sub(threshold))
        else {
            return Vec::new();
        };
        self.sent
            .range(..limit)
            .filter(|(_, p)| !p.acked)
            .map(|(&pn, _)| pn)
            .collect()
    }

    /// [`detect_loss`](Self::detect_loss) with the configured threshold.
    pub fn detect_loss_default(&self) -> Vec<u64> {
        self.detect_loss(C::LOSS_THRESHOLD)
    }

    /// Drop acked sent entries and received entries older than the
    /// retention window. Unacked entries are kept. Returns how many entries
    /// were removed.
    pub fn cleanup(&mut self) -> usize {
        let cutoff = self.clock.now().saturating_sub(C::LEDGER_RETENTION_US);
        let before = self.sent.len() + self.received.len();

        self.sent.retain(|_, p| !(p.acked && p.sent_time < cutoff));
        self.received.retain(|_, p| p.received_time >= cutoff);

        let evicted = before - (self.sent.len() + self.received.len());
        if evicted > 0 {
            tracing::debug!(space = %self.space, evicted, "evicted ledger entries");
        }
        evicted
    }

    pub fn get_stats(&self) -> SpaceStats {
        let acked_packets = self.sent.values().filter(|p| p.acked).count();
        SpaceStats {
            space: self.space,
            next_packet_number: self.next_packet_number,
            largest_sent: self.largest_sent,
            largest_received: self.largest_received,
            sent_packets: self.sent.len(),
            received_packets: self.received.len(),
            acked_packets,
            unacked_packets: self.sent.len() - acked_packets,
        }
    }

    /// Wire length for `pn`; see [`number::packet_number_len`].
    pub fn packet_number_len(&self, pn: u64) -> usize {
        number::packet_number_len(pn)
    }
}

impl<K: Clock, C: CodecConfig> fmt::Debug for PacketNumberSpace<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketNumberSpace")
            .field("space", &self.space)
            .field("next_packet_number", &self.next_packet_number)
            .field("largest_sent", &self.largest_sent)
            .field("largest_received", &self.largest_received)
            .field("sent", &self.sent.len())
            .field("received", &self.received.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct TestClock(Cell<Instant>);

    impl TestClock {
        fn new() -> Self {
            Self(Cell::new(0))
        }

        fn advance(&self, us: u64) {
            self.0.set(self.0.get() + us);
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.0.get()
        }
    }

    fn space(clock: &TestClock) -> PacketNumberSpace<&TestClock> {
        PacketNumberSpace::new(SpaceId::Application, clock)
    }

    #[test]
    fn allocation_is_monotonic() {
        let clock = TestClock::new();
        let mut s = space(&clock);
        assert_eq!(s.largest_sent(), None);
        for expected in 0..5 {
            assert_eq!(s.next_packet_number(), expected);
            assert_eq!(s.get_next(), Ok(expected));
        }
        assert_eq!(s.largest_sent(), Some(4));
        assert_eq!(s.get_unacknowledged(), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn duplicate_rejection() {
        let clock = TestClock::new();
        let mut s = space(&clock);
        assert!(s.record_received(5).is_ok());
        assert!(!s.is_valid(5));
        assert_eq!(s.record_received(5), Err(Error::InvalidPacketNumber(5)));
        assert_eq!(s.largest_received(), Some(5));

        s.record_received(2).unwrap();
        assert_eq!(s.largest_received(), Some(5));
    }

    #[test]
    fn out_of_range_rejected() {
        let clock = TestClock::new();
        let mut s = space(&clock);
        assert!(s.is_valid(MAX_PACKET_NUMBER));
        assert!(!s.is_valid(MAX_PACKET_NUMBER + 1));
        assert_eq!(
            s.record_received(u64::MAX),
            Err(Error::InvalidPacketNumber(u64::MAX))
        );
    }

    #[test]
    fn acknowledge_unknown_is_ignored() {
        let clock = TestClock::new();
        let mut s = space(&clock);
        s.get_next().unwrap();
        s.acknowledge(42);
        assert_eq!(s.get_unacknowledged(), [0]);

        clock.advance(10);
        s.acknowledge(0);
        assert_eq!(s.sent_packet(0).unwrap().ack_time, Some(10));
        clock.advance(10);
        s.acknowledge(0);
        assert_eq!(s.sent_packet(0).unwrap().ack_time, Some(10));
    }

    #[test]
    fn loss_detection() {
        let clock = TestClock::new();
        let mut s = space(&clock);
        for _ in 0..5 {
            s.get_next().unwrap();
        }
        assert!(s.detect_loss(1).is_empty());

        s.acknowledge(2);
        s.acknowledge(4);
        assert_eq!(s.largest_acked(), Some(4));
        assert_eq!(s.detect_loss(1), [0, 1]);
        // 4 - 3 = 1: only packet 0 is far enough behind
        assert_eq!(s.detect_loss_default(), [0]);
        // threshold above the largest acked
        assert!(s.detect_loss(10).is_empty());
    }

    #[test]
    fn cleanup_keeps_unacked_and_recent() {
        let clock = TestClock::new();
        let mut s = space(&clock);
        s.get_next().unwrap(); // 0, acked below
        s.get_next().unwrap(); // 1, never acked
        s.record_received(7).unwrap();
        s.acknowledge(0);

        clock.advance(DefaultConfig::LEDGER_RETENTION_US);
        assert_eq!(s.cleanup(), 0);

        clock.advance(1);
        s.get_next().unwrap(); // 2, fresh
        s.acknowledge(2);
        assert_eq!(s.cleanup(), 2);

        assert!(s.sent_packet(0).is_none());
        assert!(s.sent_packet(1).is_some());
        assert!(s.sent_packet(2).is_some());
        assert!(s.received_packet(7).is_none());
        // evicted numbers are valid again but allocation never goes back
        assert!(s.is_valid(7));
        assert_eq!(s.get_next(), Ok(3));
    }

    #[test]
    fn stats_snapshot() {
        let clock = TestClock::new();
        let mut s = PacketNumberSpace::<_>::new(SpaceId::Handshake, &clock);
        s.get_next().unwrap();
        s.get_next().unwrap();
        s.acknowledge(1);
        s.record_received(0).unwrap();

        assert_eq!(
            s.get_stats(),
            SpaceStats {
                space: SpaceId::Handshake,
                next_packet_number: 2,
                largest_sent: Some(1),
                largest_received: Some(0),
                sent_packets: 2,
                received_packets: 1,
                acked_packets: 1,
                unacked_packets: 1,
            }
        );
        assert_eq!(s.space().name(), "Handshake");
        assert_eq!(s.packet_number_len(256), 2);
    }

    #[test]
    fn allocation_stops_at_largest_packet_number() {
        let clock = TestClock::new();
        let mut s: PacketNumberSpace<&TestClock> =
            PacketNumberSpace::with_first_packet_number(SpaceId::Initial, &clock, MAX_PACKET_NUMBER)
                .unwrap();
        assert_eq!(s.get_next(), Ok(MAX_PACKET_NUMBER));
        assert_eq!(
            s.get_next(),
            Err(Error::InvalidPacketNumber(MAX_PACKET_NUMBER + 1))
        );
        assert_eq!(s.largest_sent(), Some(MAX_PACKET_NUMBER));
        assert_eq!(s.get_unacknowledged(), [MAX_PACKET_NUMBER]);
        assert_eq!(s.next_packet_number(), MAX_PACKET_NUMBER + 1);

        let over = PacketNumberSpace::<&TestClock>::with_first_packet_number(
            SpaceId::Initial,
            &clock,
            MAX_PACKET_NUMBER + 1,
        );
        assert!(matches!(over, Err(Error::InvalidPacketNumber(_))));
    }
}
