//! QUIC packet types and codec.
//!
//! This module translates between raw datagram bytes and typed packets:
//! headers, packet numbers and the opaque payload. Payloads are carried
//! as-is; protection is applied by the caller.

pub mod decoder;
pub mod encoder;
pub mod handshake;
pub mod initial;
pub mod long_header;
pub mod number;
pub mod retry;
pub mod short_header;
pub mod stateless_reset;
pub mod version_negotiation;
pub mod zero_rtt;

use alloc::vec::Vec;
use core::fmt;

use crate::error::Error;
use crate::space::SpaceId;
use crate::transport::Rng;

pub use decoder::PacketDecoder;
pub use encoder::PacketEncoder;
pub use handshake::HandshakePacket;
pub use initial::InitialPacket;
pub use long_header::{decode_long_header, encode_long_header, LongHeaderInfo};
pub use number::{
    decode_packet_number, decode_packet_number_full, encode_packet_number, packet_number_len,
    MAX_PACKET_NUMBER,
};
pub use retry::RetryPacket;
pub use short_header::OneRttPacket;
pub use stateless_reset::StatelessResetPacket;
pub use version_negotiation::VersionNegotiationPacket;
pub use zero_rtt::ZeroRttPacket;

/// QUIC v1 version number (RFC 9000).
pub const QUIC_VERSION_1: u32 = 0x00000001;

/// Header form bit: 1 = long header, 0 = short header.
pub const HEADER_FORM_BIT: u8 = 0x80;

/// Fixed bit, set in every QUIC v1 packet.
pub const FIXED_BIT: u8 = 0x40;

/// Long header packet type bits (bits 5-4 of the first byte).
pub const LONG_PACKET_TYPE_MASK: u8 = 0x30;

/// Key phase bit of a short header.
pub const KEY_PHASE_BIT: u8 = 0x04;

/// Packet number length bits, encoding `length - 1`.
pub const PACKET_NUMBER_LENGTH_MASK: u8 = 0x03;

/// The closed set of packet formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    Initial,
    ZeroRtt,
    Handshake,
    Retry,
    VersionNegotiation,
    /// Short header application data.
    OneRtt,
    StatelessReset,
}

impl PacketType {
    /// All packet types, long header types first.
    pub const ALL: [PacketType; 7] = [
        PacketType::Initial,
        PacketType::ZeroRtt,
        PacketType::Handshake,
        PacketType::Retry,
        PacketType::VersionNegotiation,
        PacketType::OneRtt,
        PacketType::StatelessReset,
    ];

    pub const fn is_long_header(self) -> bool {
        matches!(
            self,
            PacketType::Initial
                | PacketType::ZeroRtt
                | PacketType::Handshake
                | PacketType::Retry
                | PacketType::VersionNegotiation
        )
    }

    pub const fn has_packet_number(self) -> bool {
        !matches!(
            self,
            PacketType::Retry | PacketType::VersionNegotiation | PacketType::StatelessReset
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            PacketType::Initial => "Initial",
            PacketType::ZeroRtt => "0-RTT",
            PacketType::Handshake => "Handshake",
            PacketType::Retry => "Retry",
            PacketType::VersionNegotiation => "Version Negotiation",
            PacketType::OneRtt => "1-RTT",
            PacketType::StatelessReset => "Stateless Reset",
        }
    }

    /// The 2-bit long packet type code, for the four types that have one.
    pub const fn long_type_bits(self) -> Option<u8> {
        match self {
            PacketType::Initial => Some(0b00),
            PacketType::ZeroRtt => Some(0b01),
            PacketType::Handshake => Some(0b10),
            PacketType::Retry => Some(0b11),
            _ => None,
        }
    }

    /// Map a 2-bit long packet type code back to its type.
    pub fn from_long_type_bits(bits: u8) -> Result<Self, Error> {
        match bits {
            0b00 => Ok(PacketType::Initial),
            0b01 => Ok(PacketType::ZeroRtt),
            0b10 => Ok(PacketType::Handshake),
            0b11 => Ok(PacketType::Retry),
            other => Err(Error::UnknownType(other)),
        }
    }

    /// Packet number space this type's packet numbers belong to.
    pub const fn number_space(self) -> Option<SpaceId> {
        match self {
            PacketType::Initial => Some(SpaceId::Initial),
            PacketType::Handshake => Some(SpaceId::Handshake),
            PacketType::ZeroRtt | PacketType::OneRtt => Some(SpaceId::Application),
            PacketType::Retry | PacketType::VersionNegotiation | PacketType::StatelessReset => None,
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Largest connection ID length a one-byte length prefix can describe.
pub const MAX_CID_LEN: usize = 255;

/// QUIC connection ID (`0..=255` bytes on the long-header wire format).
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ConnectionId(heapless::Vec<u8, MAX_CID_LEN>);

impl ConnectionId {
    pub const MAX_LEN: usize = MAX_CID_LEN;

    /// Create a connection ID from bytes.
    pub fn new(bytes: &[u8]) -> Result<Self, Error> {
        heapless::Vec::from_slice(bytes)
            .map(Self)
            .map_err(|_| Error::OutOfRange(bytes.len() as u64))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for ConnectionId {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Error> {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for ConnectionId {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId(")?;
        for b in self.as_bytes() {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// A decoded (or to-be-encoded) QUIC packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Initial(InitialPacket),
    ZeroRtt(ZeroRttPacket),
    Handshake(HandshakePacket),
    Retry(RetryPacket),
    VersionNegotiation(VersionNegotiationPacket),
    OneRtt(OneRttPacket),
    StatelessReset(StatelessResetPacket),
}

impl Packet {
    /// Classify and decode `buf` with the default configuration.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        PacketDecoder::<crate::config::DefaultConfig>::new().decode(buf)
    }

    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Initial(_) => PacketType::Initial,
            Packet::ZeroRtt(_) => PacketType::ZeroRtt,
            Packet::Handshake(_) => PacketType::Handshake,
            Packet::Retry(_) => PacketType::Retry,
            Packet::VersionNegotiation(_) => PacketType::VersionNegotiation,
            Packet::OneRtt(_) => PacketType::OneRtt,
            Packet::StatelessReset(_) => PacketType::StatelessReset,
        }
    }

    /// Packet number, present iff the type carries one.
    pub fn packet_number(&self) -> Option<u64> {
        match self {
            Packet::Initial(p) => Some(p.packet_number),
            Packet::ZeroRtt(p) => Some(p.packet_number),
            Packet::Handshake(p) => Some(p.packet_number),
            Packet::OneRtt(p) => Some(p.packet_number),
            Packet::Retry(_) | Packet::VersionNegotiation(_) | Packet::StatelessReset(_) => None,
        }
    }

    /// Opaque payload; empty for types without one.
    pub fn payload(&self) -> &[u8] {
        match self {
            Packet::Initial(p) => &p.payload,
            Packet::ZeroRtt(p) => &p.payload,
            Packet::Handshake(p) => &p.payload,
            Packet::OneRtt(p) => &p.payload,
            Packet::Retry(_) | Packet::VersionNegotiation(_) | Packet::StatelessReset(_) => &[],
        }
    }

    /// Long-header version field (`0` for Version Negotiation).
    pub fn version(&self) -> Option<u32> {
        match self {
            Packet::Initial(p) => Some(p.version),
            Packet::ZeroRtt(p) => Some(p.version),
            Packet::Handshake(p) => Some(p.version),
            Packet::Retry(p) => Some(p.version),
            Packet::VersionNegotiation(_) => Some(0),
            Packet::OneRtt(_) | Packet::StatelessReset(_) => None,
        }
    }

    pub fn destination_connection_id(&self) -> Option<&ConnectionId> {
        match self {
            Packet::Initial(p) => Some(&p.dcid),
            Packet::ZeroRtt(p) => Some(&p.dcid),
            Packet::Handshake(p) => Some(&p.dcid),
            Packet::Retry(p) => Some(&p.dcid),
            Packet::VersionNegotiation(p) => Some(&p.dcid),
            Packet::OneRtt(p) => Some(&p.dcid),
            Packet::StatelessReset(_) => None,
        }
    }

    /// Source connection ID; only long headers carry one.
    pub fn source_connection_id(&self) -> Option<&ConnectionId> {
        match self {
            Packet::Initial(p) => Some(&p.scid),
            Packet::ZeroRtt(p) => Some(&p.scid),
            Packet::Handshake(p) => Some(&p.scid),
            Packet::Retry(p) => Some(&p.scid),
            Packet::VersionNegotiation(p) => Some(&p.scid),
            Packet::OneRtt(_) | Packet::StatelessReset(_) => None,
        }
    }

    /// Append the wire encoding of this packet to `out`.
    ///
    /// `rng` is only drawn from for Stateless Reset packets. On error `out`
    /// is left unchanged. A 1-RTT destination connection ID of any length is
    /// written as is; [`PacketEncoder`] checks it against the decoder's
    /// configured length.
    pub fn encode<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut Vec<u8>) -> Result<(), Error> {
        let start = out.len();
        let res = match self {
            Packet::Initial(p) => p.encode(out),
            Packet::ZeroRtt(p) => p.encode(out),
            Packet::Handshake(p) => p.encode(out),
            Packet::Retry(p) => p.encode(out),
            Packet::VersionNegotiation(p) => p.encode(out),
            Packet::OneRtt(p) => p.encode(out),
            Packet::StatelessReset(p) => {
                p.encode(rng, out);
                Ok(())
            }
        };
        if res.is_err() {
            out.truncate(start);
        }
        res
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.encode(rng, &mut out)?;
        Ok(out)
    }

    /// Size of the wire encoding, without encoding.
    pub fn encoded_len(&self) -> Result<usize, Error> {
        match self {
            Packet::Initial(p) => p.encoded_len(),
            Packet::ZeroRtt(p) => p.encoded_len(),
            Packet::Handshake(p) => p.encoded_len(),
            Packet::Retry(p) => p.encoded_len(),
            Packet::VersionNegotiation(p) => p.encoded_len(),
            Packet::OneRtt(p) => p.encoded_len(),
            Packet::StatelessReset(p) => Ok(p.encoded_len()),
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Packet {
                fn from(p: $ty) -> Self {
                    Packet::$variant(p)
                }
            }
        )*
    };
}

impl_from_variant!(
    Initial(InitialPacket),
    ZeroRtt(ZeroRttPacket),
    Handshake(HandshakePacket),
    Retry(RetryPacket),
    VersionNegotiation(VersionNegotiationPacket),
    OneRtt(OneRttPacket),
    StatelessReset(StatelessResetPacket),
);
