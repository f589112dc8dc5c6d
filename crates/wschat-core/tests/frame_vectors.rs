//! Frame decoder vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use bytes::BytesMut;

use wschat_core::protocol::frame::decode_frame;

mod vector_loader;
use vector_loader::TestVector;

const MAX: u64 = 16 * 1024 * 1024;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

#[test]
fn frame_vectors() {
    let files = [
        "text_unmasked_hello.json",
        "text_masked_hello.json",
        "fragment_first.json",
        "len64_overflow.json",
        "truncated_payload.json",
        "binary_len16.json",
        "masked_json_join.json",
    ];

    for f in files {
        let v = load(f);
        let raw = v.frame.decode();
        let mut buf = BytesMut::from(&raw[..]);
        let res = decode_frame(&mut buf, MAX);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code(), err.code, "vector={}", v.description);
            continue;
        }

        if v.expect_incomplete {
            assert!(res.unwrap().is_none(), "vector={}", v.description);
            assert_eq!(buf.len(), raw.len(), "incomplete frame must not be consumed");
            continue;
        }

        let frame = res
            .expect("expected ok frame")
            .expect("expected a complete frame");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(frame.fin, ex["fin"].as_bool().unwrap(), "vector={}", v.description);
        assert_eq!(frame.opcode as u64, ex["opcode"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(frame.masked, ex["masked"].as_bool().unwrap(), "vector={}", v.description);
        assert_eq!(frame.payload.len() as u64, ex["payload_len"].as_u64().unwrap(), "vector={}", v.description);

        if let Some(text) = ex.get("payload_utf8").and_then(|t| t.as_str()) {
            assert_eq!(&frame.payload[..], text.as_bytes(), "vector={}", v.description);
        }
        assert!(buf.is_empty(), "vector={} left trailing bytes", v.description);
    }
}
