//! The WebDAV capabilities a [`Session`](crate::repository::Session) relies on.
//!
//! Paths crossing these traits are decoded server paths (`/remote.php/webdav/My Docs/`);
//! encoding for the wire is the transport's job.

use anyhow::Result;
use std::future::Future;
use std::path::Path;

use crate::repository::config::ConnectionConfig;
use crate::webdav::client::WebDavClient;
use crate::webdav::path::encode_path;
use crate::webdav::types::DavListing;

/// An authenticated connection to one WebDAV server.
pub trait DavTransport: Send + Sync {
    /// `PROPFIND` with `Depth: 1` on `path`.
    fn list(&self, path: &str) -> impl Future<Output = Result<DavListing>> + Send;

    /// `GET` `path` into `destination`, returning the number of bytes written.
    fn download(&self, path: &str, destination: &Path) -> impl Future<Output = Result<u64>> + Send;
}

/// Opens [`DavTransport`]s for a configuration and a username/password pair.
pub trait DavConnector: Send + Sync {
    type Transport: DavTransport;

    fn connect(
        &self,
        config: &ConnectionConfig,
        username: &str,
        password: &str,
    ) -> Result<Self::Transport>;
}

/// Default connector: a [`WebDavClient`] with Basic authentication.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebDavConnector;

impl DavConnector for WebDavConnector {
    type Transport = WebDavClient;

    fn connect(
        &self,
        config: &ConnectionConfig,
        username: &str,
        password: &str,
    ) -> Result<WebDavClient> {
        Ok(WebDavClient::new(&config.origin(), Some(username), Some(password))?
            .with_timeout(config.timeout()))
    }
}

impl DavTransport for WebDavClient {
    async fn list(&self, path: &str) -> Result<DavListing> {
        self.list_collection(&encode_path(path)).await
    }

    async fn download(&self, path: &str, destination: &Path) -> Result<u64> {
        self.download_to(&encode_path(path), destination).await
    }
}
