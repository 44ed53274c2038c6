use anyhow::{Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{HeaderMap, Method, Request, Response, StatusCode, Uri, header};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{Duration, timeout};
use tracing::{debug, warn};

use crate::common::compression::{
    BodyReader, ContentEncoding, add_accept_encoding, decompress_body, decompress_stream,
    detect_encodings,
};
use crate::common::http::{HyperClient, build_hyper_client};
use crate::webdav::streaming::parse_multistatus_stream;
use crate::webdav::types::{DavListing, Depth};
use crate::webdav::xml::{LISTING_PROPS, build_propfind_body};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// WebDAV client built on **hyper 1.x** + **rustls** with optional **Basic** credentials.
///
/// Responses are decompressed transparently (br/zstd/gzip). Cloning is cheap and reuses the
/// same connection pool.
#[derive(Clone)]
pub struct WebDavClient {
    base: Uri,
    client: HyperClient,
    auth_header: Option<header::HeaderValue>,
    default_timeout: Duration,
}

impl WebDavClient {
    /// Create a new client from a **base URL** and optional **Basic** credentials.
    ///
    /// The base may be `https://` **or** `http://`, on any port.
    pub fn new(base_url: &str, basic_user: Option<&str>, basic_pass: Option<&str>) -> Result<Self> {
        let base: Uri = base_url.parse()?;
        if base.host().is_none() {
            bail!("base URL {base_url} has no host");
        }
        let auth_header = if let (Some(u), Some(p)) = (basic_user, basic_pass) {
            let token = format!("{}:{}", u, p);
            let mut val = header::HeaderValue::from_str(&format!("Basic {}", B64.encode(token)))?;
            val.set_sensitive(true);
            Some(val)
        } else {
            None
        };

        Ok(Self {
            base,
            client: build_hyper_client(DEFAULT_TIMEOUT),
            auth_header,
            default_timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Replace the per-request deadline (default 20 s).
    pub fn with_timeout(mut self, per_request: Duration) -> Self {
        self.client = build_hyper_client(per_request);
        self.default_timeout = per_request;
        self
    }

    /// Resolve `path` against the base URL.
    ///
    /// Absolute URLs pass through, paths starting with `/` replace the base path, and
    /// relative paths are appended to it. `path` must already be percent-encoded.
    pub fn build_uri(&self, path: &str) -> Result<Uri> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path.parse()?);
        }

        let mut parts = self.base.clone().into_parts();
        let existing_path = parts
            .path_and_query
            .as_ref()
            .map(|pq| pq.path())
            .unwrap_or("/");

        let (path_only, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };

        let combined = if path_only.is_empty() {
            existing_path.to_string()
        } else if path_only.starts_with('/') {
            path_only.to_string()
        } else {
            format!("{}/{}", existing_path.trim_end_matches('/'), path_only)
        };

        let path_and_query = match query {
            Some(q) => format!("{combined}?{q}").parse()?,
            None => combined.parse()?,
        };

        parts.path_and_query = Some(path_and_query);
        Ok(Uri::from_parts(parts)?)
    }

    fn build_request(
        &self,
        method: Method,
        uri: Uri,
        mut headers: HeaderMap,
        body_bytes: Option<Bytes>,
    ) -> Result<Request<Full<Bytes>>> {
        add_accept_encoding(&mut headers);

        let mut req_builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = &self.auth_header {
            req_builder = req_builder.header(header::AUTHORIZATION, auth);
        }
        if body_bytes.is_some() && !headers.contains_key(header::CONTENT_TYPE) {
            req_builder = req_builder.header(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/xml; charset=utf-8"),
            );
        }
        for (k, v) in headers.iter() {
            req_builder = req_builder.header(k, v);
        }

        Ok(req_builder.body(Full::new(body_bytes.unwrap_or_default()))?)
    }

    // ----------- Aggregated send (Bytes) with automatic decompression -----------

    /// Generic **aggregated send** with automatic decompression (br/zstd/gzip).
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body_bytes: Option<Bytes>,
        per_req_timeout: Option<Duration>,
    ) -> Result<Response<Bytes>> {
        let deadline = per_req_timeout.unwrap_or(self.default_timeout);
        let resp = self
            .send_stream(method, path, headers, body_bytes, Some(deadline))
            .await?;

        let encodings = detect_encodings(resp.headers());
        let (mut parts, body) = resp.into_parts();
        let decompressed = timeout(deadline, decompress_body(body, &encodings))
            .await
            .map_err(|_| anyhow!("response body timed out"))??;
        normalize_decompressed_headers(&mut parts.headers, &encodings, decompressed.len());

        Ok(Response::from_parts(parts, decompressed))
    }

    // ----------- Streaming send (for parsing on the fly) -----------

    /// Generic **streaming send**. Returns a `Response<Incoming>` (not aggregated).
    pub async fn send_stream(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body_bytes: Option<Bytes>,
        per_req_timeout: Option<Duration>,
    ) -> Result<Response<Incoming>> {
        let uri = self.build_uri(path)?;
        debug!(method = %method, uri = %uri, "sending WebDAV request");
        let req = self.build_request(method, uri, headers, body_bytes)?;

        let fut = self.client.request(req);
        let resp = timeout(per_req_timeout.unwrap_or(self.default_timeout), fut)
            .await
            .map_err(|_| anyhow!("request timed out"))??;
        debug!(status = %resp.status(), "WebDAV response");
        Ok(resp)
    }

    // ----------- HTTP/WebDAV Verbs -----------

    /// Send a `GET` request and return the fully aggregated (and decompressed) body.
    pub async fn get(&self, path: &str) -> Result<Response<Bytes>> {
        self.send(Method::GET, path, HeaderMap::new(), None, None)
            .await
    }

    /// Send a WebDAV `PROPFIND` with a custom XML body and `Depth` header, returning the
    /// non-aggregated body.
    pub async fn propfind_stream(
        &self,
        path: &str,
        depth: Depth,
        xml_body: &str,
    ) -> Result<Response<Incoming>> {
        self.send_stream(
            Method::from_bytes(b"PROPFIND")?,
            path,
            propfind_headers(depth)?,
            Some(Bytes::from(xml_body.to_owned())),
            None,
        )
        .await
    }

    /// List the members of a collection with a `Depth: 1` `PROPFIND`.
    ///
    /// Non-`207` replies are returned with an empty entry list so callers can inspect
    /// the status (notably `401`).
    pub async fn list_collection(&self, path: &str) -> Result<DavListing> {
        let body = build_propfind_body(LISTING_PROPS);
        let resp = self.propfind_stream(path, Depth::One, &body).await?;
        let status = resp.status();
        if status != StatusCode::MULTI_STATUS {
            // Drain so the connection can go back to the pool.
            let _ = resp.into_body().collect().await;
            return Ok(DavListing::new(status, Vec::new()));
        }

        let encodings = detect_encodings(resp.headers());
        let entries = timeout(
            self.default_timeout,
            parse_multistatus_stream(resp.into_body(), &encodings),
        )
        .await
        .map_err(|_| anyhow!("PROPFIND body timed out"))??;
        debug!(path, entries = entries.len(), "listed collection");
        Ok(DavListing::new(status, entries))
    }

    /// Stream a `GET` of `path` into a freshly created file at `destination`.
    ///
    /// The request deadline bounds each wait for body data, not the whole transfer. On
    /// failure the partially written file is removed. Returns the number of
    /// (decompressed) bytes written.
    pub async fn download_to(&self, path: &str, destination: &Path) -> Result<u64> {
        let resp = self
            .send_stream(Method::GET, path, HeaderMap::new(), None, None)
            .await?;
        let status = resp.status();
        if !status.is_success() {
            bail!("GET {path} failed with {status}");
        }

        let encodings = detect_encodings(resp.headers());
        let mut reader = decompress_stream(resp.into_body(), &encodings);
        let mut file = File::create(destination).await?;
        match copy_with_idle_timeout(&mut reader, &mut file, self.default_timeout).await {
            Ok(written) => {
                debug!(path, bytes = written, destination = %destination.display(), "downloaded file");
                Ok(written)
            }
            Err(err) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(destination).await {
                    warn!(destination = %destination.display(), error = %rm, "could not remove partial download");
                }
                Err(err.context(format!("download of {path}")))
            }
        }
    }
}

async fn copy_with_idle_timeout(
    reader: &mut BodyReader,
    file: &mut File,
    idle: Duration,
) -> Result<u64> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = timeout(idle, reader.read(&mut buf))
            .await
            .map_err(|_| anyhow!("timed out after {idle:?} without data"))??;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).await?;
        written += n as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn propfind_headers(depth: Depth) -> Result<HeaderMap> {
    let mut h = HeaderMap::new();
    h.insert("Depth", header::HeaderValue::from_str(depth.as_str())?);
    h.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/xml; charset=utf-8"),
    );
    Ok(h)
}

fn normalize_decompressed_headers(
    headers: &mut HeaderMap,
    encodings: &[ContentEncoding],
    body_len: usize,
) {
    if encodings.is_empty() {
        return;
    }

    headers.remove(header::CONTENT_ENCODING);
    if let Ok(value) = header::HeaderValue::from_str(&body_len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    } else {
        headers.remove(header::CONTENT_LENGTH);
    }
}
