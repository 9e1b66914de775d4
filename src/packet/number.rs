//! QUIC packet number encoding and decoding (RFC 9000 section 17.1, A.3).

use alloc::vec::Vec;

use crate::error::Error;

/// Largest packet number a space may use (2^62 - 1).
pub const MAX_PACKET_NUMBER: u64 = (1 << 62) - 1;

/// Number of bytes used on the wire for `pn`.
///
/// Chosen from the magnitude of the packet number alone: values below
/// 2^8, 2^16 and 2^24 take 1, 2 and 3 bytes, everything else takes 4.
pub const fn packet_number_len(pn: u64) -> usize {
    if pn < (1 << 8) {
        1
    } else if pn < (1 << 16) {
        2
    } else if pn < (1 << 24) {
        3
    } else {
        4
    }
}

/// Reject packet numbers outside `[0, 2^62 - 1]`.
pub fn check_packet_number(pn: u64) -> Result<(), Error> {
    if pn > MAX_PACKET_NUMBER {
        return Err(Error::OutOfRange(pn));
    }
    Ok(())
}

fn check_len(len: usize) -> Result<(), Error> {
    if !(1..=4).contains(&len) {
        return Err(Error::OutOfRange(len as u64));
    }
    Ok(())
}

/// Write the low-order `len` bytes of `pn` into `buf`, big-endian.
///
/// Returns the number of bytes written.
pub fn encode_packet_number(pn: u64, len: usize, buf: &mut [u8]) -> Result<usize, Error> {
    check_len(len)?;
    if buf.len() < len {
        return Err(Error::Truncated { needed: len });
    }

    let pn_bytes = pn.to_be_bytes();
    buf[..len].copy_from_slice(&pn_bytes[8 - len..]);

    Ok(len)
}

/// Append the low-order `len` bytes of `pn` to `out`.
pub fn put_packet_number(pn: u64, len: usize, out: &mut Vec<u8>) -> Result<(), Error> {
    let mut buf = [0u8; 4];
    let written = encode_packet_number(pn, len, &mut buf)?;
    out.extend_from_slice(&buf[..written]);
    Ok(())
}

/// Read a `len`-byte big-endian packet number from the start of `buf`.
///
/// The value is returned as carried on the wire; recovering the full
/// packet number needs the connection's largest received number, see
/// [`decode_packet_number_full`].
pub fn decode_packet_number(buf: &[u8], len: usize) -> Result<u64, Error> {
    check_len(len)?;
    if buf.len() < len {
        return Err(Error::Truncated { needed: len });
    }

    let mut bytes = [0u8; 8];
    bytes[8 - len..].copy_from_slice(&buf[..len]);
    Ok(u64::from_be_bytes(bytes))
}

/// [`decode_packet_number`] at `pos`, reporting truncation relative to the
/// start of `buf`.
pub fn decode_packet_number_at(buf: &[u8], pos: usize, len: usize) -> Result<u64, Error> {
    let rest = buf.get(pos..).unwrap_or(&[]);
    decode_packet_number(rest, len).map_err(|e| match e {
        Error::Truncated { needed } => Error::Truncated {
            needed: pos + needed,
        },
        other => other,
    })
}

/// Reconstruct a full packet number from its truncated wire form.
///
/// `truncated_pn` is the raw value read from the packet.
/// `pn_len` is the number of bytes it was encoded in (1-4).
/// `largest_pn` is the largest packet number successfully processed in the
/// space, if any.
///
/// Implements the algorithm from RFC 9000 section A.3.
pub fn decode_packet_number_full(truncated_pn: u64, pn_len: usize, largest_pn: Option<u64>) -> u64 {
    let pn_nbits = (pn_len.clamp(1, 4) as u64) * 8;
    let pn_win = 1u64 << pn_nbits;
    let pn_hwin = pn_win / 2;
    let pn_mask = pn_win - 1;

    let expected_pn = largest_pn.map_or(0, |l| l + 1);

    // The candidate value: replace the lower bits of expected_pn with truncated_pn.
    let candidate_pn = (expected_pn & !pn_mask) | (truncated_pn & pn_mask);

    if candidate_pn + pn_hwin <= expected_pn && candidate_pn + pn_win <= (1u64 << 62) {
        candidate_pn + pn_win
    } else if candidate_pn > expected_pn + pn_hwin && candidate_pn >= pn_win {
        candidate_pn - pn_win
    } else {
        candidate_pn
    }
}
