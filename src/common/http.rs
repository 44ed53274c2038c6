use bytes::Bytes;
use http_body_util::Full;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tokio::time::Duration;
use tracing::warn;

/// Type alias for the Hyper client shared by the WebDAV client and the status probe.
pub type HyperClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Build a Hyper client that speaks plain HTTP or TLS on any port.
///
/// The TLS connector prefers the platform's native roots and falls back to the bundled
/// WebPKI store. `connect_timeout` bounds the TCP handshake only; per-request deadlines are
/// applied by the callers.
pub fn build_hyper_client(connect_timeout: Duration) -> HyperClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    let https_builder = HttpsConnectorBuilder::new()
        .with_native_roots()
        .unwrap_or_else(|err| {
            warn!(error = %err, "native TLS roots unavailable, using webpki roots");
            HttpsConnectorBuilder::new().with_webpki_roots()
        });

    let https = https_builder
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(8)
        .build::<_, Full<Bytes>>(https)
}
