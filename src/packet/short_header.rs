//! Short header (1-RTT) packets (RFC 9000 section 17.3).
//!
//! ```text
//! 1-RTT Packet {
//!   Header Form (1) = 0,
//!   Fixed Bit (1) = 1,
//!   Spin Bit (1),
//!   Reserved Bits (2),
//!   Key Phase (1),
//!   Packet Number Length (2),
//!   Destination Connection ID (0..160),
//!   Packet Number (8..32),
//!   Packet Payload (8..),
//! }
//! ```
//!
//! The destination connection ID has no length prefix; the receiver must
//! know the length of the IDs it issued.

use alloc::vec::Vec;

use crate::config::{CodecConfig, DefaultConfig};
use crate::error::Error;
use crate::packet::number::{
    check_packet_number, decode_packet_number_at, packet_number_len, put_packet_number,
};
use crate::packet::{
    ConnectionId, FIXED_BIT, HEADER_FORM_BIT, KEY_PHASE_BIT, PACKET_NUMBER_LENGTH_MASK,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneRttPacket {
    pub dcid: ConnectionId,
    pub key_phase: bool,
    pub packet_number: u64,
    pub payload: Vec<u8>,
}

impl OneRttPacket {
    pub fn new(dcid: ConnectionId, key_phase: bool, packet_number: u64, payload: Vec<u8>) -> Self {
        Self {
            dcid,
            key_phase,
            packet_number,
            payload,
        }
    }

    fn first_byte(&self) -> u8 {
        let mut b = FIXED_BIT | (packet_number_len(self.packet_number) as u8 - 1);
        if self.key_phase {
            b |= KEY_PHASE_BIT;
        }
        b
    }

    pub fn encoded_len(&self) -> Result<usize, Error> {
        check_packet_number(self.packet_number)?;
        Ok(1 + self.dcid.len() + packet_number_len(self.packet_number) + self.payload.len())
    }

    /// Append the packet to `out`. Spin and reserved bits are written as zero.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.reserve(self.encoded_len()?);
        out.push(self.first_byte());
        out.extend_from_slice(self.dcid.as_bytes());
        put_packet_number(self.packet_number, packet_number_len(self.packet_number), out)?;
        out.extend_from_slice(&self.payload);
        Ok(())
    }

    /// Decode assuming the default short-header connection ID length.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        Self::decode_with_dcid_len(buf, DefaultConfig::SHORT_HEADER_DCID_LEN)
    }

    /// Decode with an explicit destination connection ID length. Everything
    /// after the packet number is payload.
    pub fn decode_with_dcid_len(buf: &[u8], dcid_len: usize) -> Result<Self, Error> {
        let Some(&first_byte) = buf.first() else {
            return Err(Error::Truncated { needed: 1 });
        };
        if first_byte & HEADER_FORM_BIT != 0 {
            return Err(Error::NotShortHeader);
        }
        if first_byte & FIXED_BIT == 0 {
            return Err(Error::FixedBitViolation);
        }

        let pos = 1 + dcid_len;
        if buf.len() < pos {
            return Err(Error::Truncated { needed: pos });
        }
        let dcid = ConnectionId::new(&buf[1..pos])?;

        let pn_len = (first_byte & PACKET_NUMBER_LENGTH_MASK) as usize + 1;
        let packet_number = decode_packet_number_at(buf, pos, pn_len)?;

        Ok(Self {
            dcid,
            key_phase: first_byte & KEY_PHASE_BIT != 0,
            packet_number,
            payload: buf[pos + pn_len..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::test_util::cid;
    use alloc::vec;

    #[test]
    fn wire_layout() {
        let pkt = OneRttPacket::new(cid(&[0xcc; 8]), true, 0x0102, b"data".to_vec());
        let mut buf = Vec::new();
        pkt.encode(&mut buf).unwrap();
        assert_eq!(buf[0], 0b0100_0101);
        assert_eq!(&buf[1..9], &[0xcc; 8]);
        assert_eq!(&buf[9..11], &[0x01, 0x02]);
        assert_eq!(&buf[11..], b"data");
        assert_eq!(OneRttPacket::decode(&buf).unwrap(), pkt);
    }

    #[test]
    fn custom_dcid_length() {
        let pkt = OneRttPacket::new(cid(&[1, 2, 3, 4]), false, 5, vec![9]);
        let mut buf = Vec::new();
        pkt.encode(&mut buf).unwrap();
        assert_eq!(OneRttPacket::decode_with_dcid_len(&buf, 4).unwrap(), pkt);
        // With the default 8-byte assumption the ID swallows the rest.
        assert_eq!(
            OneRttPacket::decode(&buf),
            Err(Error::Truncated { needed: 9 })
        );
    }

    #[test]
    fn header_bits() {
        assert_eq!(
            OneRttPacket::decode(&[0xc0; 12]),
            Err(Error::NotShortHeader)
        );
        assert_eq!(
            OneRttPacket::decode(&[0x00; 12]),
            Err(Error::FixedBitViolation)
        );
        assert_eq!(OneRttPacket::decode(&[]), Err(Error::Truncated { needed: 1 }));
    }

    #[test]
    fn missing_packet_number() {
        // 4-byte packet number announced, 2 present
        let mut buf = vec![0x43];
        buf.extend_from_slice(&[0; 8]);
        buf.extend_from_slice(&[0xab, 0xcd]);
        assert_eq!(
            OneRttPacket::decode(&buf),
            Err(Error::Truncated { needed: 13 })
        );
    }
}
