//! Digest and MAC derivations used for Retry integrity tags and Stateless
//! Reset tokens.
//!
//! These are placeholders: RFC 9001 §5.8 derives the Retry integrity tag
//! with AES-128-GCM under a fixed key, and RFC 9000 §10.3.2 leaves the
//! token derivation to the endpoint. Payload protection is not handled
//! here at all.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length")
}

/// Length of a Retry integrity tag and of a Stateless Reset token.
pub const TAG_LEN: usize = 16;

/// Retry integrity tag: the first 16 bytes of
/// `SHA-256(original_dcid || retry_packet_without_tag)`.
pub fn retry_integrity_tag(original_dcid: &[u8], packet_without_tag: &[u8]) -> [u8; TAG_LEN] {
    let digest = Sha256::new()
        .chain_update(original_dcid)
        .chain_update(packet_without_tag)
        .finalize();
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&digest[..TAG_LEN]);
    tag
}

/// Stateless Reset token: the first 16 bytes of
/// `HMAC-SHA256(key = secret, msg = connection_id)`.
pub fn stateless_reset_token(connection_id: &[u8], secret: &[u8]) -> [u8; TAG_LEN] {
    let mut mac = keyed_mac(secret);
    mac.update(connection_id);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes()[..TAG_LEN]);
    tag
}

/// Check `token` against the token derived from `connection_id` and
/// `secret`, in constant time.
pub fn verify_stateless_reset_token(connection_id: &[u8], token: &[u8], secret: &[u8]) -> bool {
    if token.len() != TAG_LEN {
        return false;
    }
    let mut mac = keyed_mac(secret);
    mac.update(connection_id);
    mac.verify_truncated_left(token).is_ok()
}

/// Constant-time comparison of two byte slices.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (&x, &y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
