#![no_main]

use libfuzzer_sys::fuzz_target;
use quic_packets::varint::{decode_varint, encode_varint, varint_len};

fuzz_target!(|data: &[u8]| {
    // Any input either decodes or reports truncation; never panics.
    if let Ok((value, consumed)) = decode_varint(data) {
        assert!(consumed <= data.len());
        // Non-minimal encodings are legal on the wire, so the input may be
        // longer than the canonical form.
        assert!(consumed >= varint_len(value));

        let mut buf = [0u8; 8];
        let written = encode_varint(value, &mut buf).expect("decoded varints are in range");
        assert_eq!(written, varint_len(value));
        assert_eq!(decode_varint(&buf[..written]), Ok((value, written)));
    }
});
