//! Encode/decode scenarios for every packet format, through the public API
//! only.

use hex_literal::hex;
use quic_packets::packet::stateless_reset::MIN_STATELESS_RESET_LEN;
use quic_packets::{
    ConnectionId, Error, HandshakePacket, InitialPacket, OneRttPacket, Packet, PacketDecoder,
    PacketEncoder, PacketType, RetryPacket, Rng, StatelessResetPacket, VersionNegotiationPacket,
    ZeroRttPacket, QUIC_VERSION_1,
};

// =========================================================================
// Test infrastructure
// =========================================================================

/// A deterministic RNG for tests. Produces a predictable byte sequence
/// starting from a given seed, incrementing by 1 for each byte.
struct TestRng(u8);

impl Rng for TestRng {
    fn fill(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.0;
            self.0 = self.0.wrapping_add(1);
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn cid(bytes: &[u8]) -> ConnectionId {
    ConnectionId::new(bytes).unwrap()
}

fn encode(packet: &Packet) -> Vec<u8> {
    PacketEncoder::new(TestRng(0)).encode(packet).unwrap()
}

/// One packet of every format the classifier can report, carrying `payload`
/// where the format has one.
fn all_packets(payload: &[u8]) -> Vec<Packet> {
    let dcid = cid(&hex!("8394c8f03e515708"));
    let scid = cid(&hex!("f067a5502a4262b5"));
    vec![
        InitialPacket::new(
            QUIC_VERSION_1,
            dcid.clone(),
            scid.clone(),
            b"token".to_vec(),
            0,
            payload.to_vec(),
        )
        .into(),
        ZeroRttPacket::new(QUIC_VERSION_1, dcid.clone(), scid.clone(), 256, payload.to_vec()).into(),
        HandshakePacket::new(QUIC_VERSION_1, dcid.clone(), scid.clone(), 70_000, payload.to_vec())
            .into(),
        RetryPacket::with_integrity_tag(
            QUIC_VERSION_1,
            dcid.clone(),
            scid.clone(),
            payload.to_vec(),
            &cid(b"odcid"),
        )
        .into(),
        VersionNegotiationPacket::new(dcid.clone(), scid, vec![QUIC_VERSION_1, 0xff00_001d]).into(),
        OneRttPacket::new(dcid, true, 0x0100_0000, payload.to_vec()).into(),
    ]
}

// =========================================================================
// Round trips
// =========================================================================

#[test]
fn initial_end_to_end() {
    init_tracing();

    let pkt = InitialPacket::new(
        1,
        cid(&[0x11; 8]),
        cid(&[0x22; 8]),
        Vec::new(),
        1,
        b"XXXXXXXX".to_vec(),
    );
    let bytes = encode(&pkt.clone().into());

    // 1-byte packet number: low two bits of the first byte are zero
    assert_eq!(bytes[0], 0xc0);
    // header(7 + 16) + token length(1) + length(1) + pn(1) + payload(8)
    assert_eq!(bytes.len(), 23 + 1 + 1 + 1 + 8);
    assert_eq!(bytes[24], 9);
    assert_eq!(bytes[25], 0x01);

    let decoded = match Packet::decode(&bytes).unwrap() {
        Packet::Initial(p) => p,
        other => panic!("expected Initial, got {}", other.packet_type()),
    };
    assert_eq!(decoded.version, 1);
    assert_eq!(decoded.dcid, cid(&[0x11; 8]));
    assert_eq!(decoded.scid, cid(&[0x22; 8]));
    assert!(decoded.token.is_empty());
    assert_eq!(decoded.packet_number, 1);
    assert_eq!(decoded.payload, b"XXXXXXXX");
    assert_eq!(decoded, pkt);
}

#[test]
fn roundtrip_all_formats() {
    init_tracing();
    let large = vec![0xa5; 1500];
    for payload in [&b""[..], &b"\x01"[..], &large[..]] {
        for packet in all_packets(payload) {
            let bytes = encode(&packet);
            let decoded = Packet::decode(&bytes).unwrap();
            assert_eq!(decoded, packet, "{} with {} byte payload", packet.packet_type(), payload.len());
            assert_eq!(packet.encoded_len().unwrap(), bytes.len());
        }
    }
}

#[test]
fn encoding_is_deterministic() {
    for packet in all_packets(b"payload") {
        let a = PacketEncoder::new(TestRng(0)).encode(&packet).unwrap();
        let b = PacketEncoder::new(TestRng(99)).encode(&packet).unwrap();
        assert_eq!(a, b, "{}", packet.packet_type());
    }
}

#[test]
fn stateless_reset_roundtrip() {
    let token = StatelessResetPacket::generate_token(b"conn-1", b"secret");
    let packet: Packet = StatelessResetPacket::new(token, b"lead".to_vec()).into();

    let mut encoder = PacketEncoder::new(TestRng(0));
    let a = encoder.encode(&packet).unwrap();
    let b = encoder.encode(&packet).unwrap();
    assert_ne!(a, b);
    assert_eq!(a[a.len() - 16..], b[b.len() - 16..]);
    assert!(a.len() >= MIN_STATELESS_RESET_LEN);

    assert!(StatelessResetPacket::could_be_stateless_reset(&a));
    let decoded = StatelessResetPacket::decode(&a).unwrap();
    assert_eq!(decoded.token, token);
    assert!(decoded.random_data.starts_with(b"lead"));
    assert!(StatelessResetPacket::validate_token(b"conn-1", &decoded.token, b"secret"));

    // Without the secret it is just another short header packet.
    let decoder: PacketDecoder = PacketDecoder::new();
    assert_eq!(decoder.detect_packet_type(&a), Some(PacketType::OneRtt));
}

#[test]
fn encoder_refuses_packets_the_decoder_would_misread() {
    init_tracing();
    let mut encoder = PacketEncoder::new(TestRng(0));
    let decoder: PacketDecoder = PacketDecoder::new();

    // A 4-byte short header DCID would be read back as 8 bytes.
    let short: Packet = OneRttPacket::new(cid(&[9; 4]), false, 1, b"0123456789".to_vec()).into();
    assert!(!encoder.can_encode(&short));
    assert_eq!(
        encoder.encode(&short),
        Err(Error::InvalidFixedLength {
            expected: 8,
            actual: 4
        })
    );

    // Version 0 on the wire means Version Negotiation.
    for mut packet in all_packets(b"abc") {
        match &mut packet {
            Packet::Initial(p) => p.version = 0,
            Packet::ZeroRtt(p) => p.version = 0,
            Packet::Handshake(p) => p.version = 0,
            Packet::Retry(p) => p.version = 0,
            _ => continue,
        }
        assert!(!encoder.can_encode(&packet), "{}", packet.packet_type());
        assert_eq!(encoder.encode(&packet), Err(Error::OutOfRange(0)));
    }

    // Everything the encoder accepts decodes back to the same variant.
    for packet in all_packets(b"abc") {
        assert!(encoder.can_encode(&packet));
        let bytes = encoder.encode(&packet).unwrap();
        assert_eq!(decoder.detect_packet_type(&bytes), Some(packet.packet_type()));
    }
}

// =========================================================================
// Classification
// =========================================================================

#[test]
fn classifier_agrees_with_encoder() {
    let decoder: PacketDecoder = PacketDecoder::new();
    for packet in all_packets(b"abc") {
        let bytes = encode(&packet);
        assert!(decoder.validate_packet_format(&bytes), "{}", packet.packet_type());
        assert_eq!(decoder.detect_packet_type(&bytes), Some(packet.packet_type()));
        assert_eq!(
            decoder.try_decode(&bytes).map(|p| p.packet_type()),
            Some(packet.packet_type())
        );
    }
}

#[test]
fn coalesced_datagram_decodes_first_packet() {
    let first: Packet =
        HandshakePacket::new(QUIC_VERSION_1, cid(b"d"), cid(b"s"), 5, b"first".to_vec()).into();
    let second: Packet = OneRttPacket::new(cid(&[0; 8]), false, 6, b"second".to_vec()).into();
    let mut datagram = encode(&first);
    datagram.extend_from_slice(&encode(&second));

    assert_eq!(Packet::decode(&datagram).unwrap(), first);
}

#[test]
fn batch_decode() {
    let decoder: PacketDecoder = PacketDecoder::new();
    let packets = all_packets(b"batch");
    let buffers: Vec<Vec<u8>> = packets.iter().map(encode).collect();
    assert_eq!(decoder.decode_batch(&buffers).unwrap(), packets);

    let mut broken = buffers.clone();
    broken.insert(1, Vec::new());
    assert_eq!(decoder.decode_batch(&broken), Err(Error::EmptyInput));
}

// =========================================================================
// Malformed input
// =========================================================================

#[test]
fn retry_without_full_tag() {
    let mut bytes = hex!("f0 00000001 04 01020304 04 05060708").to_vec();
    bytes.extend_from_slice(&[0u8; 15]);
    assert_eq!(
        RetryPacket::decode(&bytes),
        Err(Error::Truncated { needed: 15 + 16 })
    );
    assert_eq!(Packet::decode(&bytes), Err(Error::Truncated { needed: 31 }));

    bytes.push(0);
    let retry = RetryPacket::decode(&bytes).unwrap();
    assert!(retry.retry_token.is_empty());
}

#[test]
fn version_negotiation_without_versions() {
    let bytes = hex!("c0 00000000 04 01020304 04 05060708");
    assert_eq!(
        VersionNegotiationPacket::decode(&bytes),
        Err(Error::EmptyVersionList)
    );
    assert_eq!(Packet::decode(&bytes), Err(Error::EmptyVersionList));
}

#[test]
fn wrong_variant_is_reported() {
    let bytes = encode(&all_packets(b"x")[0]);
    assert_eq!(
        HandshakePacket::decode(&bytes),
        Err(Error::WrongVariant {
            expected: PacketType::Handshake
        })
    );
    assert_eq!(
        ZeroRttPacket::decode(&bytes),
        Err(Error::WrongVariant {
            expected: PacketType::ZeroRtt
        })
    );
}

#[test]
fn every_prefix_fails_cleanly() {
    let decoder: PacketDecoder = PacketDecoder::new();
    for packet in all_packets(b"prefix") {
        let bytes = encode(&packet);
        for end in 0..bytes.len() {
            // Truncated 1-RTT packets still parse (the payload just shrinks)
            // once the header is complete, and Retry tokens have no length.
            let result = decoder.decode(&bytes[..end]);
            if let Ok(decoded) = result {
                assert!(matches!(
                    decoded.packet_type(),
                    PacketType::OneRtt | PacketType::Retry | PacketType::VersionNegotiation
                ));
            }
        }
    }
}

#[test]
fn fixed_bit_is_checked() {
    let mut bytes = encode(&all_packets(b"x")[2]);
    bytes[0] &= !0x40;
    assert_eq!(Packet::decode(&bytes), Err(Error::FixedBitViolation));
    let decoder: PacketDecoder = PacketDecoder::new();
    assert!(!decoder.validate_packet_format(&bytes));
}
