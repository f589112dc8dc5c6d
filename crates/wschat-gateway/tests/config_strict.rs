#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use wschat_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
  mailbox_capasity: 16 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
    assert_eq!(cfg.gateway.static_dir, "client");
    assert_eq!(cfg.gateway.mailbox_capacity, 256);
    assert_eq!(cfg.gateway.broadcast_capacity, 1024);
    assert_eq!(cfg.gateway.max_frame_bytes, 16 * 1024 * 1024);
}

#[test]
fn ok_full_config() {
    let ok = r#"
version: 1
gateway:
  listen: "127.0.0.1:9000"
  static_dir: "public"
  mailbox_capacity: 8
  broadcast_capacity: 4
  max_frame_bytes: 4096
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.gateway.listen_addr().unwrap().port(), 9000);
    assert_eq!(cfg.gateway.mailbox_capacity, 8);
    assert_eq!(cfg.gateway.max_frame_bytes, 4096);
}

#[test]
fn rejects_wrong_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code(), "UNSUPPORTED_VERSION");
}

#[test]
fn rejects_out_of_range_values() {
    let cases = [
        "version: 1\ngateway:\n  mailbox_capacity: 0\n",
        "version: 1\ngateway:\n  broadcast_capacity: 100000\n",
        "version: 1\ngateway:\n  max_frame_bytes: 10\n",
        "version: 1\ngateway:\n  listen: \"not-an-addr\"\n",
    ];
    for yaml in cases {
        let err = config::load_from_str(yaml).expect_err(yaml);
        assert_eq!(err.code(), "BAD_REQUEST", "{yaml}");
    }
}
