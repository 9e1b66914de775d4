//! Stateless Reset (RFC 9000 section 10.3).
//!
//! ```text
//! Stateless Reset {
//!   Fixed Bits (2) = 1,
//!   Unpredictable Bits (38..),
//!   Stateless Reset Token (128),
//! }
//! ```
//!
//! A reset looks like a 1-RTT packet to anyone without the token, so the
//! classifier never reports one. A receiver that suspects a reset decodes it
//! here and checks the trailing token against the tokens it holds.

use alloc::vec::Vec;

use crate::crypto::{stateless_reset_token, verify_stateless_reset_token, TAG_LEN};
use crate::error::Error;
use crate::packet::{FIXED_BIT, HEADER_FORM_BIT};
use crate::transport::Rng;

/// Smallest datagram accepted as a possible Stateless Reset.
pub const MIN_STATELESS_RESET_LEN: usize = 22;

/// Unpredictable bytes written between the first byte and the token.
const MIN_RANDOM_LEN: usize = 21;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatelessResetPacket {
    pub token: [u8; TAG_LEN],
    /// Leading unpredictable bytes. Encoding pads this with generator
    /// output to at least 21 bytes.
    pub random_data: Vec<u8>,
}

impl StatelessResetPacket {
    pub fn new(token: [u8; TAG_LEN], random_data: Vec<u8>) -> Self {
        Self { token, random_data }
    }

    /// Build from a token slice, which must be exactly 16 bytes.
    pub fn from_slice(token: &[u8], random_data: Vec<u8>) -> Result<Self, Error> {
        let token: [u8; TAG_LEN] = token.try_into().map_err(|_| Error::InvalidFixedLength {
            expected: TAG_LEN,
            actual: token.len(),
        })?;
        Ok(Self::new(token, random_data))
    }

    /// A reset whose random section alone makes the datagram at least
    /// `min_len` bytes long.
    pub fn with_min_length<R: Rng + ?Sized>(token: [u8; TAG_LEN], min_len: usize, rng: &mut R) -> Self {
        let mut random_data = alloc::vec![0u8; min_len.saturating_sub(1 + TAG_LEN)];
        rng.fill(&mut random_data);
        Self::new(token, random_data)
    }

    fn random_len(&self) -> usize {
        self.random_data.len().max(MIN_RANDOM_LEN)
    }

    pub fn encoded_len(&self) -> usize {
        1 + self.random_len() + TAG_LEN
    }

    /// Append the packet to `out`, drawing the six low first-byte bits and
    /// any missing padding from `rng`.
    pub fn encode<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());

        let mut first = [0u8; 1];
        rng.fill(&mut first);
        out.push(FIXED_BIT | (first[0] & 0x3f));

        out.extend_from_slice(&self.random_data);
        let pad_start = out.len();
        out.resize(pad_start + (self.random_len() - self.random_data.len()), 0);
        rng.fill(&mut out[pad_start..]);

        out.extend_from_slice(&self.token);
    }

    /// The token is the final 16 bytes; everything between the first byte
    /// and the token is returned as `random_data`.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < MIN_STATELESS_RESET_LEN {
            return Err(Error::InvalidFixedLength {
                expected: MIN_STATELESS_RESET_LEN,
                actual: buf.len(),
            });
        }
        if buf[0] & FIXED_BIT == 0 {
            return Err(Error::FixedBitViolation);
        }
        if buf[0] & HEADER_FORM_BIT != 0 {
            return Err(Error::NotShortHeader);
        }

        let token_start = buf.len() - TAG_LEN;
        let mut token = [0u8; TAG_LEN];
        token.copy_from_slice(&buf[token_start..]);

        Ok(Self {
            token,
            random_data: buf[1..token_start].to_vec(),
        })
    }

    /// Placeholder token derivation; see [`crate::crypto::stateless_reset_token`].
    pub fn generate_token(connection_id: &[u8], secret: &[u8]) -> [u8; TAG_LEN] {
        stateless_reset_token(connection_id, secret)
    }

    /// Constant-time check of `token` against the one derived for
    /// `connection_id`.
    pub fn validate_token(connection_id: &[u8], token: &[u8], secret: &[u8]) -> bool {
        verify_stateless_reset_token(connection_id, token, secret)
    }

    /// Structural check only: long enough, fixed bit set, form bit clear.
    /// A true result does not mean the datagram is a reset.
    pub fn could_be_stateless_reset(buf: &[u8]) -> bool {
        buf.len() >= MIN_STATELESS_RESET_LEN
            && buf[0] & FIXED_BIT != 0
            && buf[0] & HEADER_FORM_BIT == 0
    }
}
