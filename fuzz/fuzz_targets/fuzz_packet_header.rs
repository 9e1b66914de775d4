#![no_main]

use libfuzzer_sys::fuzz_target;
use quic_packets::packet::{
    decode_long_header, HandshakePacket, InitialPacket, OneRttPacket, RetryPacket,
    StatelessResetPacket, VersionNegotiationPacket, ZeroRttPacket,
};
use quic_packets::{Packet, PacketDecoder};

fuzz_target!(|data: &[u8]| {
    let decoder: PacketDecoder = PacketDecoder::new();

    let detected = decoder.detect_packet_type(data);
    let _ = decoder.validate_packet_format(data);
    if let Ok(packet) = decoder.decode(data) {
        // Whatever decodes was classified the same way.
        assert_eq!(detected, Some(packet.packet_type()));
        let _ = packet.encoded_len();
    }

    let _ = decode_long_header(data);
    let _ = InitialPacket::decode(data);
    let _ = ZeroRttPacket::decode(data);
    let _ = HandshakePacket::decode(data);
    let _ = RetryPacket::decode(data);
    let _ = VersionNegotiationPacket::decode(data);
    let _ = StatelessResetPacket::decode(data);
    let _ = StatelessResetPacket::could_be_stateless_reset(data);
    for dcid_len in 0..=20 {
        let _ = OneRttPacket::decode_with_dcid_len(data, dcid_len);
    }

    let _ = Packet::decode(data);
});
