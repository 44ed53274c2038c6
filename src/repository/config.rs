use hyper::Uri;
use tokio::time::Duration;

use crate::repository::error::SessionError;

/// URL suggested to administrators when adding an instance.
pub const DEFAULT_WEBDAV_URL: &str = "https://foo.bar.baz/remote.php/webdav/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Connection parameters derived once from the instance's WebDAV URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    tls: bool,
    root_path: String,
    timeout: Duration,
}

impl ConnectionConfig {
    /// Parse a base WebDAV URL such as `https://cloud.example.com/remote.php/webdav/`.
    ///
    /// `https` selects TLS (default port 443); every other scheme is plaintext (default
    /// port 80). The root path is the URL path minus one trailing `/`.
    pub fn from_base_url(base_url: &str) -> Result<Self, SessionError> {
        let uri: Uri = base_url
            .trim()
            .parse()
            .map_err(|err| SessionError::InvalidConfig(format!("{base_url:?}: {err}")))?;

        let scheme = uri
            .scheme_str()
            .ok_or_else(|| SessionError::InvalidConfig(format!("{base_url:?} has no scheme")))?;
        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SessionError::InvalidConfig(format!("{base_url:?} has no host")))?;

        let tls = scheme.eq_ignore_ascii_case("https");
        let port = uri.port_u16().unwrap_or(if tls { 443 } else { 80 });
        let path = uri.path().trim_end_matches(' ');
        let root_path = path.strip_suffix('/').unwrap_or(path).to_string();

        Ok(Self {
            host: host.to_string(),
            port,
            tls,
            root_path,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls { "https" } else { "http" }
    }

    /// `scheme://host:port`, without any path.
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.host, self.port)
    }
}

/// One WebDAV endpoint as configured by an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInstance {
    pub id: u64,
    /// Display name; also the key material for cached password encryption.
    pub name: String,
    pub webdav_url: String,
}

impl RepositoryInstance {
    pub fn new(id: u64, name: impl Into<String>, webdav_url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            webdav_url: webdav_url.into(),
        }
    }

    pub fn connection_config(&self) -> Result<ConnectionConfig, SessionError> {
        ConnectionConfig::from_base_url(&self.webdav_url)
    }
}
