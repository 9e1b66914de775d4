//! Packet classification and dispatch.

use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::config::{CodecConfig, DefaultConfig};
use crate::error::Error;
use crate::packet::{
    HandshakePacket, InitialPacket, OneRttPacket, Packet, PacketType, RetryPacket,
    VersionNegotiationPacket, ZeroRttPacket, FIXED_BIT, HEADER_FORM_BIT,
};

/// First byte plus version.
const MIN_LONG_LEN: usize = 5 + 1;
/// First byte, version and both connection ID length bytes.
const MIN_VERSION_NEGOTIATION_LEN: usize = 7;
const MIN_SHORT_LEN: usize = 2;

fn read_version(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]])
}

/// Decodes datagrams into [`Packet`]s.
///
/// Stateless; `C` supplies the short-header connection ID length.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketDecoder<C: CodecConfig = DefaultConfig> {
    _config: PhantomData<C>,
}

impl<C: CodecConfig> PacketDecoder<C> {
    pub const fn new() -> Self {
        Self {
            _config: PhantomData,
        }
    }

    /// Classify `buf` by its first byte (and version, for long headers) and
    /// decode it as that variant.
    ///
    /// Stateless Resets are reported as 1-RTT packets.
    pub fn decode(&self, buf: &[u8]) -> Result<Packet, Error> {
        let Some(&first_byte) = buf.first() else {
            return Err(Error::EmptyInput);
        };

        if first_byte & HEADER_FORM_BIT == 0 {
            tracing::trace!(len = buf.len(), "dispatching short header packet");
            return OneRttPacket::decode_with_dcid_len(buf, C::SHORT_HEADER_DCID_LEN).map(Packet::OneRtt);
        }

        if buf.len() < MIN_LONG_LEN {
            return Err(Error::Truncated {
                needed: MIN_LONG_LEN,
            });
        }

        let version = read_version(buf);
        if version == 0 {
            tracing::trace!(len = buf.len(), "dispatching version negotiation packet");
            return VersionNegotiationPacket::decode(buf).map(Packet::VersionNegotiation);
        }

        let ty = PacketType::from_long_type_bits((first_byte >> 4) & 0x03)?;
        tracing::trace!(packet_type = %ty, version, len = buf.len(), "dispatching long header packet");
        match ty {
            PacketType::Initial => InitialPacket::decode(buf).map(Packet::Initial),
            PacketType::ZeroRtt => ZeroRttPacket::decode(buf).map(Packet::ZeroRtt),
            PacketType::Handshake => HandshakePacket::decode(buf).map(Packet::Handshake),
            PacketType::Retry => RetryPacket::decode(buf).map(Packet::Retry),
            other => Err(Error::WrongVariant { expected: other }),
        }
    }

    /// [`decode`](Self::decode), discarding the error.
    pub fn try_decode(&self, buf: &[u8]) -> Option<Packet> {
        match self.decode(buf) {
            Ok(packet) => Some(packet),
            Err(error) => {
                tracing::debug!(%error, len = buf.len(), "dropping undecodable packet");
                None
            }
        }
    }

    /// Decode each buffer in order. The first failure aborts the batch.
    pub fn decode_batch<I>(&self, bufs: I) -> Result<Vec<Packet>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        bufs.into_iter().map(|b| self.decode(b.as_ref())).collect()
    }

    /// The type [`decode`](Self::decode) would dispatch to, without parsing
    /// the body. `None` when `buf` is too short to classify.
    pub fn detect_packet_type(&self, buf: &[u8]) -> Option<PacketType> {
        let &first_byte = buf.first()?;
        if first_byte & HEADER_FORM_BIT == 0 {
            return Some(PacketType::OneRtt);
        }
        if buf.len() < MIN_LONG_LEN {
            return None;
        }
        if read_version(buf) == 0 {
            return Some(PacketType::VersionNegotiation);
        }
        PacketType::from_long_type_bits((first_byte >> 4) & 0x03).ok()
    }

    /// Cheap structural pre-check: fixed bit set and the minimum length for
    /// the header form. Individual fields are not validated.
    pub fn validate_packet_format(&self, buf: &[u8]) -> bool {
        let Some(&first_byte) = buf.first() else {
            return false;
        };
        if first_byte & FIXED_BIT == 0 {
            return false;
        }
        if first_byte & HEADER_FORM_BIT == 0 {
            return buf.len() >= MIN_SHORT_LEN;
        }
        if buf.len() < MIN_LONG_LEN {
            return false;
        }
        read_version(buf) != 0 || buf.len() >= MIN_VERSION_NEGOTIATION_LEN
    }
}
