//! Retry packets (RFC 9000 section 17.2.5).
//!
//! ```text
//! Retry Packet {
//!   Header Form (1) = 1,
//!   Fixed Bit (1) = 1,
//!   Long Packet Type (2) = 3,
//!   Unused (4),
//!   Version (32),
//!   Destination Connection ID Length (8),
//!   Destination Connection ID (0..160),
//!   Source Connection ID Length (8),
//!   Source Connection ID (0..160),
//!   Retry Token (..),
//!   Retry Integrity Tag (128),
//! }
//! ```
//!
//! The Retry token has no length prefix: it runs to the final 16 bytes.

use alloc::vec::Vec;

use crate::crypto::{ct_eq, retry_integrity_tag, TAG_LEN};
use crate::error::Error;
use crate::packet::long_header::{
    check_version, decode_long_header_for, encode_long_header, long_header_len,
};
use crate::packet::{ConnectionId, PacketType};

const TYPE_BITS: u8 = 0b11;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPacket {
    pub version: u32,
    pub dcid: ConnectionId,
    pub scid: ConnectionId,
    pub retry_token: Vec<u8>,
    pub integrity_tag: [u8; TAG_LEN],
}

impl RetryPacket {
    pub fn new(
        version: u32,
        dcid: ConnectionId,
        scid: ConnectionId,
        retry_token: Vec<u8>,
        integrity_tag: [u8; TAG_LEN],
    ) -> Self {
        Self {
            version,
            dcid,
            scid,
            retry_token,
            integrity_tag,
        }
    }

    /// Like [`RetryPacket::new`] with the tag given as a slice, which must be
    /// exactly 16 bytes.
    pub fn from_parts(
        version: u32,
        dcid: ConnectionId,
        scid: ConnectionId,
        retry_token: Vec<u8>,
        integrity_tag: &[u8],
    ) -> Result<Self, Error> {
        let tag: [u8; TAG_LEN] =
            integrity_tag
                .try_into()
                .map_err(|_| Error::InvalidFixedLength {
                    expected: TAG_LEN,
                    actual: integrity_tag.len(),
                })?;
        Ok(Self::new(version, dcid, scid, retry_token, tag))
    }

    /// Build a Retry packet whose tag is computed over its own encoding and
    /// the client's original destination connection ID.
    pub fn with_integrity_tag(
        version: u32,
        dcid: ConnectionId,
        scid: ConnectionId,
        retry_token: Vec<u8>,
        original_dcid: &ConnectionId,
    ) -> Self {
        let mut pkt = Self::new(version, dcid, scid, retry_token, [0; TAG_LEN]);
        let mut without_tag = Vec::with_capacity(pkt.wire_len());
        pkt.encode_without_tag(&mut without_tag);
        pkt.integrity_tag = Self::generate_integrity_tag(original_dcid.as_bytes(), &without_tag);
        pkt
    }

    /// Placeholder tag derivation; see [`crate::crypto::retry_integrity_tag`].
    pub fn generate_integrity_tag(original_dcid: &[u8], packet_without_tag: &[u8]) -> [u8; TAG_LEN] {
        retry_integrity_tag(original_dcid, packet_without_tag)
    }

    /// Recompute the tag for `original_dcid` and compare in constant time.
    pub fn validate_integrity_tag(&self, original_dcid: &ConnectionId) -> bool {
        let mut without_tag = Vec::with_capacity(self.wire_len());
        self.encode_without_tag(&mut without_tag);
        let expected = Self::generate_integrity_tag(original_dcid.as_bytes(), &without_tag);
        ct_eq(&expected, &self.integrity_tag)
    }

    fn wire_len(&self) -> usize {
        long_header_len(&self.dcid, &self.scid) + self.retry_token.len() + TAG_LEN
    }

    pub fn encoded_len(&self) -> Result<usize, Error> {
        check_version(self.version)?;
        Ok(self.wire_len())
    }

    fn encode_without_tag(&self, out: &mut Vec<u8>) {
        encode_long_header(TYPE_BITS, 0, self.version, &self.dcid, &self.scid, out);
        out.extend_from_slice(&self.retry_token);
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.reserve(self.encoded_len()?);
        self.encode_without_tag(out);
        out.extend_from_slice(&self.integrity_tag);
        Ok(())
    }

    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let (hdr, pos) = decode_long_header_for(buf, PacketType::Retry)?;

        if buf.len() - pos < TAG_LEN {
            return Err(Error::Truncated {
                needed: pos + TAG_LEN,
            });
        }
        let tag_start = buf.len() - TAG_LEN;
        let mut integrity_tag = [0u8; TAG_LEN];
        integrity_tag.copy_from_slice(&buf[tag_start..]);

        Ok(Self {
            version: hdr.version,
            dcid: hdr.dcid,
            scid: hdr.scid,
            retry_token: buf[pos..tag_start].to_vec(),
            integrity_tag,
        })
    }
}
