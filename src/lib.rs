#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! QUIC packet framing: variable-length integers, packet numbers, long and
//! short headers, the seven packet formats and per-space packet number
//! bookkeeping. Payloads are opaque; protection happens elsewhere.

#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;

pub mod config;
pub mod crypto;
pub mod error;
pub mod packet;
pub mod space;
pub mod transport;
pub mod varint;

pub use config::{CodecConfig, DefaultConfig};
pub use error::Error;
pub use packet::{
    ConnectionId, HandshakePacket, InitialPacket, OneRttPacket, Packet, PacketDecoder,
    PacketEncoder, PacketType, RetryPacket, StatelessResetPacket, VersionNegotiationPacket,
    ZeroRttPacket, QUIC_VERSION_1,
};
pub use space::{PacketNumberSpace, SpaceId, SpaceStats};
pub use transport::{Clock, Instant, Rng};

#[cfg(feature = "std")]
pub use transport::SystemClock;
