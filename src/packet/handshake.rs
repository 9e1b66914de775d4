//! Handshake packets (RFC 9000 section 17.2.4).
//!
//! Same layout as Initial without the token fields:
//! `header | Length (i) | Packet Number (8..32) | Payload`.

use alloc::vec::Vec;

use crate::error::Error;
use crate::packet::long_header::{
    check_version, decode_long_header_for, decode_numbered_body, encode_long_header,
    encode_numbered_body, long_header_len, numbered_body_len, pn_type_bits,
};
use crate::packet::{ConnectionId, PacketType};

const TYPE_BITS: u8 = 0b10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakePacket {
    pub version: u32,
    pub dcid: ConnectionId,
    pub scid: ConnectionId,
    pub packet_number: u64,
    pub payload: Vec<u8>,
}

impl HandshakePacket {
    pub fn new(
        version: u32,
        dcid: ConnectionId,
        scid: ConnectionId,
        packet_number: u64,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            version,
            dcid,
            scid,
            packet_number,
            payload,
        }
    }

    pub fn encoded_len(&self) -> Result<usize, Error> {
        check_version(self.version)?;
        Ok(long_header_len(&self.dcid, &self.scid)
            + numbered_body_len(self.packet_number, &self.payload)?)
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.reserve(self.encoded_len()?);
        encode_long_header(
            TYPE_BITS,
            pn_type_bits(self.packet_number),
            self.version,
            &self.dcid,
            &self.scid,
            out,
        );
        encode_numbered_body(self.packet_number, &self.payload, out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let (hdr, pos) = decode_long_header_for(buf, PacketType::Handshake)?;
        let (packet_number, payload) = decode_numbered_body(buf, pos, hdr.type_specific_bits)?;
        Ok(Self {
            version: hdr.version,
            dcid: hdr.dcid,
            scid: hdr.scid,
            packet_number,
            payload,
        })
    }
}
