use owncloud_dav_rs::{ConnectionConfig, DEFAULT_WEBDAV_URL, RepositoryInstance, SessionError};
use std::time::Duration;

#[test]
fn https_defaults_to_tls_on_443() {
    let config = ConnectionConfig::from_base_url("https://cloud.example.com/remote.php/webdav/")
        .expect("valid url");
    assert!(config.is_tls());
    assert_eq!(config.port(), 443);
    assert_eq!(config.host(), "cloud.example.com");
    assert_eq!(config.root_path(), "/remote.php/webdav");
    assert_eq!(config.origin(), "https://cloud.example.com:443");
}

#[test]
fn http_defaults_to_plaintext_on_80() {
    let config = ConnectionConfig::from_base_url("http://files.local/owncloud/remote.php/webdav")
        .expect("valid url");
    assert!(!config.is_tls());
    assert_eq!(config.port(), 80);
    assert_eq!(config.scheme(), "http");
    assert_eq!(config.root_path(), "/owncloud/remote.php/webdav");
}

#[test]
fn explicit_port_wins() {
    let config = ConnectionConfig::from_base_url("https://cloud.example.com:8443/dav/")
        .expect("valid url");
    assert!(config.is_tls());
    assert_eq!(config.port(), 8443);
    assert_eq!(config.origin(), "https://cloud.example.com:8443");
}

#[test]
fn root_path_strips_one_trailing_slash_and_spaces() {
    let config = ConnectionConfig::from_base_url("  https://h/remote.php/webdav/  ")
        .expect("valid url");
    assert_eq!(config.root_path(), "/remote.php/webdav");

    let doubled = ConnectionConfig::from_base_url("https://h/dav//").expect("valid url");
    assert_eq!(doubled.root_path(), "/dav/");

    let bare = ConnectionConfig::from_base_url("https://h").expect("valid url");
    assert_eq!(bare.root_path(), "");
}

#[test]
fn unparseable_urls_are_invalid_config() {
    for url in ["", "not a url", "/remote.php/webdav/", "https://"] {
        let err = ConnectionConfig::from_base_url(url).expect_err("must be rejected");
        assert!(matches!(err, SessionError::InvalidConfig(_)), "{url:?} gave {err:?}");
    }
}

#[test]
fn timeout_is_configurable() {
    let config = ConnectionConfig::from_base_url(DEFAULT_WEBDAV_URL).expect("valid url");
    assert_eq!(config.timeout(), Duration::from_secs(20));
    let config = config.with_timeout(Duration::from_secs(3));
    assert_eq!(config.timeout(), Duration::from_secs(3));
}

#[test]
fn instance_derives_its_connection() {
    let instance = RepositoryInstance::new(3, "Campus cloud", "https://c.example.edu/remote.php/webdav/");
    let config = instance.connection_config().expect("valid url");
    assert_eq!(config.host(), "c.example.edu");
}
