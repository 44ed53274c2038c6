//! Response decompression for HTTP content encodings.
//!
//! The client advertises `br, zstd, gzip` on every request; PROPFIND replies from large
//! folders and downloaded files are transparently decoded here.

use anyhow::Result;
use async_compression::tokio::bufread::{BrotliDecoder, GzipDecoder, ZstdDecoder};
use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::BodyStream;
use hyper::body::Incoming;
use hyper::{HeaderMap, header, http};
use tokio::io::{AsyncBufRead, AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

/// Boxed reader produced by [`decompress_stream`].
pub type BodyReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Content encodings the client knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Identity,
    Br,
    Gzip,
    Zstd,
}

impl ContentEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::Identity => "identity",
            ContentEncoding::Br => "br",
            ContentEncoding::Gzip => "gzip",
            ContentEncoding::Zstd => "zstd",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "br" => Some(ContentEncoding::Br),
            "gzip" | "x-gzip" => Some(ContentEncoding::Gzip),
            "zstd" | "zst" => Some(ContentEncoding::Zstd),
            _ => None,
        }
    }
}

/// Read the response `Content-Encoding` header into the ordered chain of encodings.
///
/// Ordered as applied by the server (outermost last). Empty means identity.
pub fn detect_encodings(headers: &HeaderMap) -> Vec<ContentEncoding> {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|val| val.to_str().ok())
        .map(|raw| raw.split(',').filter_map(ContentEncoding::from_token).collect())
        .unwrap_or_default()
}

/// Insert an `Accept-Encoding` header (`br, zstd, gzip`) if not already present.
pub fn add_accept_encoding(h: &mut HeaderMap) {
    if !h.contains_key(header::ACCEPT_ENCODING) {
        h.insert(
            header::ACCEPT_ENCODING,
            http::HeaderValue::from_static("br, zstd, gzip"),
        );
    }
}

fn wrap_decoders(reader: BodyReader, encodings: &[ContentEncoding]) -> BodyReader {
    encodings
        .iter()
        .rev()
        .fold(reader, |current, encoding| match encoding {
            ContentEncoding::Identity => current,
            ContentEncoding::Br => Box::new(BufReader::new(BrotliDecoder::new(current))),
            ContentEncoding::Gzip => Box::new(BufReader::new(GzipDecoder::new(current))),
            ContentEncoding::Zstd => Box::new(BufReader::new(ZstdDecoder::new(current))),
        })
}

/// Wrap a response body in a buffered reader that undoes `encodings`.
pub fn decompress_stream(body: Incoming, encodings: &[ContentEncoding]) -> BodyReader {
    let stream = BodyStream::new(body)
        .map_ok(|frame| frame.into_data().unwrap_or_default())
        .map_err(std::io::Error::other);
    let reader: BodyReader = Box::new(BufReader::new(StreamReader::new(stream)));
    wrap_decoders(reader, encodings)
}

/// Aggregate and decompress a whole response body.
pub async fn decompress_body(body: Incoming, encodings: &[ContentEncoding]) -> Result<Bytes> {
    let mut decoder = decompress_stream(body, encodings);
    let mut out = Vec::with_capacity(16 * 1024);
    decoder.read_to_end(&mut out).await?;
    Ok(Bytes::from(out))
}
