//! Validation of an instance URL against ownCloud's `status.php` endpoint.

use serde::Deserialize;
use tokio::time::Duration;
use tracing::debug;

use crate::repository::config::ConnectionConfig;
use crate::repository::error::SessionError;
use crate::webdav::client::WebDavClient;

/// Body of `status.php`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub installed: bool,
    #[serde(default)]
    pub maintenance: bool,
    pub version: Option<String>,
    pub versionstring: Option<String>,
    pub edition: Option<String>,
    pub productname: Option<String>,
}

/// Map a WebDAV URL to the server's status URL:
/// `https://h/owncloud/remote.php/webdav/` → `https://h/owncloud/status.php`.
pub fn status_url(webdav_url: &str) -> String {
    webdav_url
        .trim()
        .replace("/remote.php/webdav", "/status.php")
        .trim_end_matches(['/', ' '])
        .to_string()
}

/// Fetch and check `status.php` for the instance URL.
///
/// Fails with [`SessionError::InvalidConfig`] when the URL is unusable or the server
/// reports that ownCloud is not installed, and with [`SessionError::TransferError`] when
/// the status document cannot be fetched or parsed.
pub async fn check_server_status(
    webdav_url: &str,
    timeout: Duration,
) -> Result<ServerStatus, SessionError> {
    ConnectionConfig::from_base_url(webdav_url)?;
    let url = status_url(webdav_url);

    let client = WebDavClient::new(&url, None, None)
        .map_err(|err| SessionError::InvalidConfig(format!("{url:?}: {err}")))?
        .with_timeout(timeout);
    let resp = client
        .get("")
        .await
        .map_err(|err| SessionError::transfer(format!("GET {url}"), err))?;

    let status: ServerStatus = serde_json::from_slice(resp.body()).map_err(|err| {
        SessionError::transfer(
            format!("decoding {url} (HTTP {})", resp.status()),
            err,
        )
    })?;
    debug!(url = %url, installed = status.installed, version = ?status.version, "server status");

    if !status.installed {
        return Err(SessionError::InvalidConfig(format!(
            "{webdav_url:?} does not point at an installed ownCloud server"
        )));
    }
    Ok(status)
}
