//! Packet serialization front end.

use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::config::{CodecConfig, DefaultConfig};
use crate::error::Error;
use crate::packet::Packet;
use crate::transport::Rng;

/// Encodes [`Packet`]s, owning the randomness source that Stateless Reset
/// padding draws from.
///
/// `C` must match the peer's decoder: 1-RTT packets are only accepted when
/// their destination connection ID is `C::SHORT_HEADER_DCID_LEN` bytes,
/// since the short header carries no length for it.
#[derive(Debug)]
pub struct PacketEncoder<R: Rng, C: CodecConfig = DefaultConfig> {
    rng: R,
    _config: PhantomData<C>,
}

impl<R: Rng> PacketEncoder<R> {
    /// Encoder for the default configuration.
    pub fn new(rng: R) -> Self {
        Self::with_config(rng)
    }
}

impl<R: Rng, C: CodecConfig> PacketEncoder<R, C> {
    pub fn with_config(rng: R) -> Self {
        Self {
            rng,
            _config: PhantomData,
        }
    }

    /// Validate `packet` against the configuration and return its size.
    fn check(&self, packet: &Packet) -> Result<usize, Error> {
        if let Packet::OneRtt(p) = packet {
            if p.dcid.len() != C::SHORT_HEADER_DCID_LEN {
                return Err(Error::InvalidFixedLength {
                    expected: C::SHORT_HEADER_DCID_LEN,
                    actual: p.dcid.len(),
                });
            }
        }
        packet.encoded_len()
    }

    pub fn encode(&mut self, packet: &Packet) -> Result<Vec<u8>, Error> {
        self.check(packet)?;
        packet.to_bytes(&mut self.rng)
    }

    /// Encode each packet in order. The first failure aborts the batch.
    pub fn encode_batch(&mut self, packets: &[Packet]) -> Result<Vec<Vec<u8>>, Error> {
        packets.iter().map(|p| self.encode(p)).collect()
    }

    /// Same output as [`encode`](Self::encode). Reserved for an outer
    /// integrity layer.
    pub fn encode_with_checksum(&mut self, packet: &Packet) -> Result<Vec<u8>, Error> {
        self.encode(packet)
    }

    /// Size [`encode`](Self::encode) would produce.
    pub fn encoded_size(&self, packet: &Packet) -> Result<usize, Error> {
        self.check(packet)
    }

    /// Whether `packet` would encode without error.
    pub fn can_encode(&self, packet: &Packet) -> bool {
        match self.check(packet) {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!(%error, packet_type = %packet.packet_type(), "packet cannot be encoded");
                false
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}
