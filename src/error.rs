use crate::packet::PacketType;

/// Errors returned by the packet codecs and packet-number spaces.
///
/// Decoding fails fast: the first malformed field produces the error and no
/// partial packet is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A zero-length buffer was passed to a decoder.
    EmptyInput,
    /// The buffer ended before a field boundary; `needed` is the total
    /// number of bytes the field required from the start of the buffer.
    Truncated { needed: usize },
    /// The header-form bit was clear where a long header was expected.
    NotLongHeader,
    /// The header-form bit was set where a short header was expected.
    NotShortHeader,
    /// The fixed bit (0x40) of the first byte was not set.
    FixedBitViolation,
    /// The long-header type bits belong to a different packet variant.
    WrongVariant { expected: PacketType },
    /// Type code outside the defined set.
    UnknownType(u8),
    /// Value too large for its encoding.
    OutOfRange(u64),
    /// A field with a fixed size had the wrong length.
    InvalidFixedLength { expected: usize, actual: usize },
    /// Packet number is above 2^62 - 1 or already recorded in the space.
    InvalidPacketNumber(u64),
    /// Version Negotiation packet without any supported version.
    EmptyVersionList,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input"),
            Error::Truncated { needed } => write!(f, "truncated packet, need {needed} bytes"),
            Error::NotLongHeader => write!(f, "not a long header packet"),
            Error::NotShortHeader => write!(f, "not a short header packet"),
            Error::FixedBitViolation => write!(f, "fixed bit must be set"),
            Error::WrongVariant { expected } => write!(f, "not a {expected} packet"),
            Error::UnknownType(t) => write!(f, "unknown packet type: 0x{t:02x}"),
            Error::OutOfRange(v) => write!(f, "value out of range: {v}"),
            Error::InvalidFixedLength { expected, actual } => {
                write!(f, "expected {expected} bytes, got {actual}")
            }
            Error::InvalidPacketNumber(pn) => write!(f, "invalid packet number: {pn}"),
            Error::EmptyVersionList => write!(f, "version negotiation without supported versions"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
