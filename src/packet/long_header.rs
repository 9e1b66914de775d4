//! Long header framing shared by all long header packets (RFC 9000 section 17.2).
//!
//! ```text
//! Long Header Packet {
//!   Header Form (1) = 1,
//!   Fixed Bit (1) = 1,
//!   Long Packet Type (2),
//!   Type-Specific Bits (4),
//!   Version (32),
//!   Destination Connection ID Length (8),
//!   Destination Connection ID (0..2040),
//!   Source Connection ID Length (8),
//!   Source Connection ID (0..2040),
//!   Type-Specific Payload (..),
//! }
//! ```

use alloc::vec::Vec;

use crate::error::Error;
use crate::packet::number::{
    check_packet_number, decode_packet_number_at, packet_number_len, put_packet_number,
};
use crate::packet::{
    ConnectionId, PacketType, FIXED_BIT, HEADER_FORM_BIT, PACKET_NUMBER_LENGTH_MASK,
};
use crate::varint::{decode_varint_at, put_varint, varint_len, MAX_VARINT};

/// Minimum: 1 (first byte) + 4 (version) + 1 (dcid len) + 1 (scid len).
pub const MIN_LONG_HEADER_LEN: usize = 7;

/// Common long header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongHeaderInfo {
    /// 2-bit long packet type code.
    pub type_bits: u8,
    /// Low 4 bits of the first byte; meaning depends on the packet type.
    pub type_specific_bits: u8,
    pub version: u32,
    pub dcid: ConnectionId,
    pub scid: ConnectionId,
}

impl LongHeaderInfo {
    /// Packet type named by the type bits. Version Negotiation is identified
    /// by its version field, not by these bits.
    pub fn packet_type(&self) -> Result<PacketType, Error> {
        PacketType::from_long_type_bits(self.type_bits)
    }
}

/// Encoded size of the common long header prefix.
pub fn long_header_len(dcid: &ConnectionId, scid: &ConnectionId) -> usize {
    MIN_LONG_HEADER_LEN + dcid.len() + scid.len()
}

/// Append the common long header prefix to `out`.
///
/// First byte is `0b1_1_TT_SSSS`: form bit, fixed bit, 2-bit type,
/// 4 type-specific bits.
pub fn encode_long_header(
    type_bits: u8,
    type_specific_bits: u8,
    version: u32,
    dcid: &ConnectionId,
    scid: &ConnectionId,
    out: &mut Vec<u8>,
) {
    out.reserve(long_header_len(dcid, scid));

    out.push(HEADER_FORM_BIT | FIXED_BIT | ((type_bits & 0x03) << 4) | (type_specific_bits & 0x0f));
    out.extend_from_slice(&version.to_be_bytes());

    // ConnectionId guarantees len <= 255.
    out.push(dcid.len() as u8);
    out.extend_from_slice(dcid.as_bytes());

    out.push(scid.len() as u8);
    out.extend_from_slice(scid.as_bytes());
}

/// Parse the common long header fields from a buffer.
///
/// Returns the header fields and the offset of the first byte after the
/// source connection ID.
pub fn decode_long_header(buf: &[u8]) -> Result<(LongHeaderInfo, usize), Error> {
    if buf.len() < MIN_LONG_HEADER_LEN {
        return Err(Error::Truncated {
            needed: MIN_LONG_HEADER_LEN,
        });
    }

    let first_byte = buf[0];

    if first_byte & HEADER_FORM_BIT == 0 {
        return Err(Error::NotLongHeader);
    }
    if first_byte & FIXED_BIT == 0 {
        return Err(Error::FixedBitViolation);
    }

    let type_bits = (first_byte >> 4) & 0x03;
    let type_specific_bits = first_byte & 0x0f;
    let version = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);

    let (dcid, pos) = read_connection_id(buf, 5)?;
    let (scid, pos) = read_connection_id(buf, pos)?;

    Ok((
        LongHeaderInfo {
            type_bits,
            type_specific_bits,
            version,
            dcid,
            scid,
        },
        pos,
    ))
}

/// Reject version 0 for a typed long header: on the wire it marks the packet
/// as Version Negotiation.
pub(crate) fn check_version(version: u32) -> Result<(), Error> {
    if version == 0 {
        return Err(Error::OutOfRange(0));
    }
    Ok(())
}

/// [`decode_long_header`], additionally requiring the type bits of `expected`.
pub(crate) fn decode_long_header_for(
    buf: &[u8],
    expected: PacketType,
) -> Result<(LongHeaderInfo, usize), Error> {
    let (hdr, pos) = decode_long_header(buf)?;
    if Some(hdr.type_bits) != expected.long_type_bits() {
        return Err(Error::WrongVariant { expected });
    }
    Ok((hdr, pos))
}

/// Read a one-byte length prefix and the connection ID it describes.
pub(crate) fn read_connection_id(buf: &[u8], pos: usize) -> Result<(ConnectionId, usize), Error> {
    let Some(&len) = buf.get(pos) else {
        return Err(Error::Truncated { needed: pos + 1 });
    };
    let start = pos + 1;
    let end = start + len as usize;
    if end > buf.len() {
        return Err(Error::Truncated { needed: end });
    }
    Ok((ConnectionId::new(&buf[start..end])?, end))
}

// ---------------------------------------------------------------------------
// Length + packet number + payload, shared by Initial, 0-RTT and Handshake
// ---------------------------------------------------------------------------

/// Type-specific bits for a packet-numbered long header: the packet number
/// length minus one in the low two bits, reserved bits zero.
pub(crate) fn pn_type_bits(pn: u64) -> u8 {
    (packet_number_len(pn) as u8 - 1) & PACKET_NUMBER_LENGTH_MASK
}

/// Validate the fields of a numbered body and return the Length field value.
pub(crate) fn numbered_body_length(pn: u64, payload: &[u8]) -> Result<u64, Error> {
    check_packet_number(pn)?;
    let length = (packet_number_len(pn) + payload.len()) as u64;
    if length > MAX_VARINT {
        return Err(Error::OutOfRange(length));
    }
    Ok(length)
}

/// Encoded size of Length + packet number + payload.
pub(crate) fn numbered_body_len(pn: u64, payload: &[u8]) -> Result<usize, Error> {
    let length = numbered_body_length(pn, payload)?;
    Ok(varint_len(length) + length as usize)
}

/// Append Length (varint), the truncated packet number and the payload.
pub(crate) fn encode_numbered_body(pn: u64, payload: &[u8], out: &mut Vec<u8>) -> Result<(), Error> {
    let length = numbered_body_length(pn, payload)?;
    put_varint(length, out)?;
    put_packet_number(pn, packet_number_len(pn), out)?;
    out.extend_from_slice(payload);
    Ok(())
}

/// Parse Length, packet number and payload starting at `pos`.
///
/// Bytes after the payload are left alone; they belong to the next packet
/// in a coalesced datagram.
pub(crate) fn decode_numbered_body(
    buf: &[u8],
    pos: usize,
    type_specific_bits: u8,
) -> Result<(u64, Vec<u8>), Error> {
    let (length, consumed) = decode_varint_at(buf, pos)?;
    let pos = pos + consumed;

    let pn_len = (type_specific_bits & PACKET_NUMBER_LENGTH_MASK) as usize + 1;
    let packet_number = decode_packet_number_at(buf, pos, pn_len)?;
    let pos = pos + pn_len;

    let payload_len = length
        .checked_sub(pn_len as u64)
        .ok_or(Error::OutOfRange(length))?;
    let end = usize::try_from(payload_len)
        .ok()
        .and_then(|len| pos.checked_add(len))
        .ok_or(Error::OutOfRange(length))?;
    if end > buf.len() {
        return Err(Error::Truncated { needed: end });
    }

    Ok((packet_number, buf[pos..end].to_vec()))
}
