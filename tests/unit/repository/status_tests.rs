use crate::support::{CannedResponse, init_tracing, serve};
use owncloud_dav_rs::{SessionError, check_server_status, status_url};
use std::time::Duration;

const STATUS_OK: &str = r#"{"installed":true,"maintenance":false,"needsDbUpgrade":false,"version":"10.13.4.1","versionstring":"10.13.4","edition":"Community","productname":"ownCloud"}"#;

#[test]
fn status_url_replaces_the_webdav_suffix() {
    assert_eq!(
        status_url("https://cloud.example.com/owncloud/remote.php/webdav/"),
        "https://cloud.example.com/owncloud/status.php"
    );
    assert_eq!(
        status_url("  https://cloud.example.com/remote.php/webdav  "),
        "https://cloud.example.com/status.php"
    );
}

#[test]
fn status_url_leaves_other_urls_alone_apart_from_trailing_slashes() {
    assert_eq!(
        status_url("https://files.example.com/dav//"),
        "https://files.example.com/dav"
    );
}

#[tokio::test]
async fn installed_server_is_accepted() {
    init_tracing();
    let (origin, server) = serve(vec![
        CannedResponse::new(200, "OK")
            .header("Content-Type", "application/json")
            .body(STATUS_OK.as_bytes()),
    ])
    .await;

    let status = check_server_status(
        &format!("{origin}/remote.php/webdav/"),
        Duration::from_secs(5),
    )
    .await
    .expect("status check");
    assert!(status.installed);
    assert!(!status.maintenance);
    assert_eq!(status.versionstring.as_deref(), Some("10.13.4"));
    assert_eq!(status.productname.as_deref(), Some("ownCloud"));

    let requests = server.await.expect("server task");
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].target, "/status.php");
}

#[tokio::test]
async fn server_without_installation_is_invalid_config() {
    let (origin, server) = serve(vec![
        CannedResponse::new(200, "OK").body(br#"{"installed":false}"#),
    ])
    .await;

    let err = check_server_status(&format!("{origin}/remote.php/webdav/"), Duration::from_secs(5))
        .await
        .expect_err("not installed");
    assert!(matches!(err, SessionError::InvalidConfig(_)));
    server.await.expect("server task");
}

#[tokio::test]
async fn non_json_status_is_a_transfer_error() {
    let (origin, server) = serve(vec![
        CannedResponse::new(404, "Not Found")
            .header("Content-Type", "text/html")
            .body(b"<html>nothing here</html>"),
    ])
    .await;

    let err = check_server_status(&format!("{origin}/remote.php/webdav/"), Duration::from_secs(5))
        .await
        .expect_err("html body");
    assert!(matches!(err, SessionError::TransferError { .. }));
    assert!(err.to_string().contains("404"));
    server.await.expect("server task");
}

#[tokio::test]
async fn malformed_url_is_rejected_before_any_request() {
    let err = check_server_status("not a url", Duration::from_secs(1))
        .await
        .expect_err("invalid");
    assert!(matches!(err, SessionError::InvalidConfig(_)));
}
