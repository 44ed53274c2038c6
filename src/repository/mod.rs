//! ownCloud repository core: connection configuration, per-user credential caching and the
//! session that lists and imports files.

pub mod config;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod listing;
pub mod session;
pub mod status;
pub mod transport;

pub use config::{ConnectionConfig, DEFAULT_WEBDAV_URL, RepositoryInstance};
pub use credentials::{Credential, CredentialStore, JsonFileCredentialStore, MemoryCredentialStore};
pub use crypto::{AesGcmPasswordCipher, PasswordCipher};
pub use error::{CryptoError, SessionError, StoreError};
pub use listing::{Breadcrumb, EntryKind, Listing, ListingEntry};
pub use session::Session;
pub use status::{ServerStatus, check_server_status, status_url};
pub use transport::{DavConnector, DavTransport, WebDavConnector};
