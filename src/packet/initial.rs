//! Initial packets (RFC 9000 section 17.2.2).
//!
//! ```text
//! Initial Packet {
//!   Header Form (1) = 1,
//!   Fixed Bit (1) = 1,
//!   Long Packet Type (2) = 0,
//!   Reserved Bits (2),
//!   Packet Number Length (2),
//!   Version (32),
//!   Destination Connection ID Length (8),
//!   Destination Connection ID (0..160),
//!   Source Connection ID Length (8),
//!   Source Connection ID (0..160),
//!   Token Length (i),
//!   Token (..),
//!   Length (i),
//!   Packet Number (8..32),
//!   Packet Payload (8..),
//! }
//! ```

use alloc::vec::Vec;

use crate::error::Error;
use crate::packet::long_header::{
    check_version, decode_long_header_for, decode_numbered_body, encode_long_header,
    encode_numbered_body, long_header_len, numbered_body_len, pn_type_bits,
};
use crate::packet::{ConnectionId, PacketType};
use crate::varint::{decode_varint_at, put_varint, varint_len, MAX_VARINT};

const TYPE_BITS: u8 = 0b00;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialPacket {
    pub version: u32,
    pub dcid: ConnectionId,
    pub scid: ConnectionId,
    /// Address validation token; empty when the client has none.
    pub token: Vec<u8>,
    pub packet_number: u64,
    pub payload: Vec<u8>,
}

impl InitialPacket {
    pub fn new(
        version: u32,
        dcid: ConnectionId,
        scid: ConnectionId,
        token: Vec<u8>,
        packet_number: u64,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            version,
            dcid,
            scid,
            token,
            packet_number,
            payload,
        }
    }

    fn check_token(&self) -> Result<(), Error> {
        let len = self.token.len() as u64;
        if len > MAX_VARINT {
            return Err(Error::OutOfRange(len));
        }
        Ok(())
    }

    pub fn encoded_len(&self) -> Result<usize, Error> {
        check_version(self.version)?;
        self.check_token()?;
        Ok(long_header_len(&self.dcid, &self.scid)
            + varint_len(self.token.len() as u64)
            + self.token.len()
            + numbered_body_len(self.packet_number, &self.payload)?)
    }

    /// Append the packet to `out`. Fields are validated before anything is
    /// written.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        let total = self.encoded_len()?;
        out.reserve(total);

        encode_long_header(
            TYPE_BITS,
            pn_type_bits(self.packet_number),
            self.version,
            &self.dcid,
            &self.scid,
            out,
        );
        put_varint(self.token.len() as u64, out)?;
        out.extend_from_slice(&self.token);
        encode_numbered_body(self.packet_number, &self.payload, out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let (hdr, pos) = decode_long_header_for(buf, PacketType::Initial)?;

        let (token_len, consumed) = decode_varint_at(buf, pos)?;
        let pos = pos + consumed;
        let token_end = usize::try_from(token_len)
            .ok()
            .and_then(|len| pos.checked_add(len))
            .ok_or(Error::OutOfRange(token_len))?;
        if token_end > buf.len() {
            return Err(Error::Truncated { needed: token_end });
        }
        let token = buf[pos..token_end].to_vec();

        let (packet_number, payload) =
            decode_numbered_body(buf, token_end, hdr.type_specific_bits)?;

        Ok(Self {
            version: hdr.version,
            dcid: hdr.dcid,
            scid: hdr.scid,
            token,
            packet_number,
            payload,
        })
    }
}
