//! QUIC variable-length integer encoding (RFC 9000 §16).
//!
//! | 2MSB | Length  | Usable Bits | Range                        |
//! |------|---------|-------------|------------------------------|
//! | 00   | 1 byte  | 6           | 0–63                         |
//! | 01   | 2 bytes | 14          | 0–16383                      |
//! | 10   | 4 bytes | 30          | 0–1073741823                 |
//! | 11   | 8 bytes | 62          | 0–4611686018427387903        |

use alloc::vec::Vec;

use crate::error::Error;

/// Maximum value representable as a QUIC varint (2^62 - 1).
pub const MAX_VARINT: u64 = (1 << 62) - 1;

/// How many bytes are needed to encode `value`?
///
/// Values above [`MAX_VARINT`] report 8; [`encode_varint`] rejects them.
pub const fn varint_len(value: u64) -> usize {
    if value <= 63 {
        1
    } else if value <= 16383 {
        2
    } else if value <= 1_073_741_823 {
        4
    } else {
        8
    }
}

/// Decode a QUIC variable-length integer from the start of `buf`.
///
/// Returns `(value, bytes_consumed)` on success.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), Error> {
    let Some(&first) = buf.first() else {
        return Err(Error::Truncated { needed: 1 });
    };

    let len = 1usize << (first >> 6);
    if buf.len() < len {
        return Err(Error::Truncated { needed: len });
    }

    let mut bytes = [0u8; 8];
    bytes[8 - len..].copy_from_slice(&buf[..len]);
    bytes[8 - len] &= 0x3f;

    Ok((u64::from_be_bytes(bytes), len))
}

/// Decode a varint located at `pos` in `buf`.
///
/// Unlike [`decode_varint`], a truncation error reports `needed` relative to
/// the start of `buf`, which is what the packet decoders surface.
pub fn decode_varint_at(buf: &[u8], pos: usize) -> Result<(u64, usize), Error> {
    let rest = buf.get(pos..).unwrap_or(&[]);
    decode_varint(rest).map_err(|e| match e {
        Error::Truncated { needed } => Error::Truncated {
            needed: pos + needed,
        },
        other => other,
    })
}

/// Encode a QUIC variable-length integer into `buf`.
///
/// Returns the number of bytes written.
pub fn encode_varint(value: u64, buf: &mut [u8]) -> Result<usize, Error> {
    if value > MAX_VARINT {
        return Err(Error::OutOfRange(value));
    }

    let len = varint_len(value);
    if buf.len() < len {
        return Err(Error::Truncated { needed: len });
    }

    let bytes = value.to_be_bytes();
    buf[..len].copy_from_slice(&bytes[8 - len..]);
    buf[0] |= match len {
        1 => 0x00,
        2 => 0x40,
        4 => 0x80,
        _ => 0xc0,
    };

    Ok(len)
}

/// Append a QUIC variable-length integer to `out`.
pub fn put_varint(value: u64, out: &mut Vec<u8>) -> Result<usize, Error> {
    let mut buf = [0u8; 8];
    let len = encode_varint(value, &mut buf)?;
    out.extend_from_slice(&buf[..len]);
    Ok(len)
}
