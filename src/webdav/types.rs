use hyper::StatusCode;

/// WebDAV Depth
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
    Infinity,
}
impl Depth {
    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Zero => "0",
            Depth::One => "1",
            Depth::Infinity => "infinity",
        }
    }
}

/// One `<D:response>` of a `207 Multi-Status` reply, as sent by the server.
///
/// `href` is left percent-encoded; property values are the trimmed element text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DavEntry {
    pub href: String,
    /// Response-level `<D:status>`, present when the whole resource failed.
    pub status: Option<String>,
    /// One status line per `<D:propstat>`, in document order.
    pub propstat_statuses: Vec<String>,
    pub is_collection: bool,
    pub displayname: Option<String>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub last_modified: Option<String>,
}

impl DavEntry {
    /// True when the server reported the resource itself as missing.
    ///
    /// ownCloud answers unknown properties with a `404` propstat next to a `200` one,
    /// so a single `404` propstat is not enough.
    pub fn is_not_found(&self) -> bool {
        if let Some(status) = &self.status {
            return status_is_not_found(status);
        }
        !self.propstat_statuses.is_empty()
            && self.propstat_statuses.iter().all(|s| status_is_not_found(s))
    }
}

fn status_is_not_found(status_line: &str) -> bool {
    status_line.contains("404")
}

/// Outcome of a directory `PROPFIND`: the HTTP status and, on `207`, the parsed entries.
#[derive(Debug, Clone)]
pub struct DavListing {
    pub status: StatusCode,
    pub entries: Vec<DavEntry>,
}

impl DavListing {
    pub fn new(status: StatusCode, entries: Vec<DavEntry>) -> Self {
        Self { status, entries }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }
}
