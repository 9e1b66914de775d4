//! Version Negotiation packets (RFC 9000 section 17.2.1).
//!
//! Identified by a version field of zero rather than by the type bits.
//! The body is a list of 32-bit versions running to the end of the datagram.

use alloc::vec::Vec;

use crate::error::Error;
use crate::packet::long_header::{
    encode_long_header, long_header_len, read_connection_id, MIN_LONG_HEADER_LEN,
};
use crate::packet::{ConnectionId, PacketType, HEADER_FORM_BIT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNegotiationPacket {
    pub dcid: ConnectionId,
    pub scid: ConnectionId,
    pub supported_versions: Vec<u32>,
}

impl VersionNegotiationPacket {
    pub fn new(dcid: ConnectionId, scid: ConnectionId, supported_versions: Vec<u32>) -> Self {
        Self {
            dcid,
            scid,
            supported_versions,
        }
    }

    pub fn supports_version(&self, version: u32) -> bool {
        self.supported_versions.contains(&version)
    }

    pub fn highest_supported_version(&self) -> Option<u32> {
        self.supported_versions.iter().copied().max()
    }

    pub fn lowest_supported_version(&self) -> Option<u32> {
        self.supported_versions.iter().copied().min()
    }

    pub fn encoded_len(&self) -> Result<usize, Error> {
        if self.supported_versions.is_empty() {
            return Err(Error::EmptyVersionList);
        }
        Ok(long_header_len(&self.dcid, &self.scid) + 4 * self.supported_versions.len())
    }

    /// Append the packet to `out`. The first byte is written as `0xc0`.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.reserve(self.encoded_len()?);
        encode_long_header(0, 0, 0, &self.dcid, &self.scid, out);
        for v in &self.supported_versions {
            out.extend_from_slice(&v.to_be_bytes());
        }
        Ok(())
    }

    /// Only the header-form bit of the first byte is checked; the other
    /// seven bits are arbitrary on the wire. A trailing partial version
    /// entry is ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < MIN_LONG_HEADER_LEN {
            return Err(Error::Truncated {
                needed: MIN_LONG_HEADER_LEN,
            });
        }
        if buf[0] & HEADER_FORM_BIT == 0 {
            return Err(Error::NotLongHeader);
        }
        if u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) != 0 {
            return Err(Error::WrongVariant {
                expected: PacketType::VersionNegotiation,
            });
        }

        let (dcid, pos) = read_connection_id(buf, 5)?;
        let (scid, pos) = read_connection_id(buf, pos)?;

        let supported_versions: Vec<u32> = buf[pos..]
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        if supported_versions.is_empty() {
            return Err(Error::EmptyVersionList);
        }

        Ok(Self {
            dcid,
            scid,
            supported_versions,
        })
    }
}
