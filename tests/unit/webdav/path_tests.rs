use owncloud_dav_rs::{decode_path, encode_path};

#[test]
fn encode_keeps_separators_and_escapes_segments() {
    assert_eq!(
        encode_path("/remote.php/webdav/My Docs/50% off?.txt"),
        "/remote.php/webdav/My%20Docs/50%25%20off%3F.txt"
    );
    assert_eq!(encode_path("/"), "/");
}

#[test]
fn encode_handles_non_ascii() {
    assert_eq!(encode_path("/Übung/é.txt"), "/%C3%9Cbung/%C3%A9.txt");
}

#[test]
fn decode_reverses_percent_encoding() {
    assert_eq!(decode_path("/a%20b/c%2Fd"), "/a b/c/d");
    assert_eq!(decode_path("/C%2B%2B+notes"), "/C+++notes");
}

#[test]
fn decode_then_encode_is_stable_for_plain_paths() {
    let raw = "/remote.php/webdav/Photos/2023/";
    assert_eq!(encode_path(&decode_path(raw)), raw);
}

#[test]
fn decode_replaces_invalid_utf8() {
    assert_eq!(decode_path("/bad%FF.txt"), "/bad\u{FFFD}.txt");
    assert_eq!(decode_path("/ok%C3%A9"), "/oké");
}
