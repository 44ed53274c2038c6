//! ownCloud/WebDAV repository client for Rust.
//!
//! This library lets a host application browse and import files from an ownCloud (or any
//! WebDAV) server on behalf of its users. It is built on hyper 1.x, rustls, quick-xml and
//! tokio.
//!
//! # Features
//!
//! - Connection parameters derived from a single WebDAV URL (scheme, host, port, root path)
//! - Per-user credentials cached encrypted at rest (AES-256-GCM), purged when rejected
//! - Folder listings split into folders and files, ordered case-insensitively, with
//!   breadcrumbs and server-relative hrefs
//! - Streamed file downloads with transparent response decompression (br/zstd/gzip)
//! - Explicit per-request timeouts and a typed error taxonomy that keeps authentication
//!   failures apart from transport failures
//! - `status.php` probe to validate an instance URL
//!
//! # Examples
//!
//! ## Logging in and listing a folder
//!
//! ```no_run
//! use std::sync::Arc;
//! use owncloud_dav_rs::{
//!     AesGcmPasswordCipher, EntryKind, MemoryCredentialStore, RepositoryInstance, Session,
//!     SessionError,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SessionError> {
//!     let instance = RepositoryInstance::new(
//!         7,
//!         "Team cloud",
//!         "https://cloud.example.com/remote.php/webdav/",
//!     );
//!     let mut session = Session::new(
//!         instance,
//!         Arc::new(MemoryCredentialStore::new()),
//!         Arc::new(AesGcmPasswordCipher::new()),
//!     )?;
//!
//!     // The first login uses the supplied credentials and caches them; later logins
//!     // for the same user find the cached record.
//!     session.login(42, Some("alice"), Some("s3cret")).await?;
//!
//!     let listing = session.list_directory("/Documents/").await?;
//!     for crumb in &listing.path {
//!         println!("{} -> {}", crumb.name, crumb.path);
//!     }
//!     for entry in &listing.entries {
//!         match entry.kind {
//!             EntryKind::Folder => println!("[dir]  {}", entry.title),
//!             EntryKind::File { size } => println!("[file] {} ({size:?} bytes)", entry.title),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Importing a file
//!
//! ```no_run
//! # use owncloud_dav_rs::{Session, SessionError};
//! # async fn example(mut session: Session) -> Result<(), SessionError> {
//! let listing = session.list_directory("/").await?;
//! if let Some(file) = listing.entries.iter().find(|e| !e.is_folder()) {
//!     let local = session.fetch_file(&file.href, "/tmp/import.bin").await?;
//!     println!("saved {}", local.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Handling authentication failures
//!
//! A rejected cached credential is deleted before the error is returned, so the host can
//! simply prompt again:
//!
//! ```no_run
//! # use owncloud_dav_rs::{Session, SessionError};
//! # async fn example(mut session: Session) -> Result<(), SessionError> {
//! match session.login(42, None, None).await {
//!     Ok(()) => {}
//!     Err(err) if err.needs_login() => {
//!         // render a login form, then call login again with the entered values
//!     }
//!     Err(other) => return Err(other),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Validating an instance URL
//!
//! ```no_run
//! use owncloud_dav_rs::check_server_status;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), owncloud_dav_rs::SessionError> {
//! let status = check_server_status(
//!     "https://cloud.example.com/remote.php/webdav/",
//!     Duration::from_secs(5),
//! )
//! .await?;
//! println!("ownCloud {:?}", status.versionstring);
//! # Ok(())
//! # }
//! ```
//!
//! ## Using the WebDAV client directly
//!
//! ```no_run
//! use owncloud_dav_rs::WebDavClient;
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = WebDavClient::new("https://cloud.example.com", Some("alice"), Some("s3cret"))?;
//!     let listing = client.list_collection("/remote.php/webdav/").await?;
//!     println!("{} -> {} entries", listing.status, listing.entries.len());
//!     Ok(())
//! }
//! ```
//!
//! # Custom transports
//!
//! [`Session`] only depends on the [`DavConnector`] / [`DavTransport`] pair, so a host can
//! plug in another WebDAV client with [`Session::with_connector`].
pub mod common;
pub mod repository;
pub mod webdav;

pub use common::compression::{ContentEncoding, add_accept_encoding, detect_encodings};
pub use repository::{
    AesGcmPasswordCipher, Breadcrumb, ConnectionConfig, Credential, CredentialStore,
    CryptoError, DEFAULT_WEBDAV_URL, DavConnector, DavTransport, EntryKind,
    JsonFileCredentialStore, Listing, ListingEntry, MemoryCredentialStore, PasswordCipher,
    RepositoryInstance, ServerStatus, Session, SessionError, StoreError, WebDavConnector,
    check_server_status, status_url,
};
pub use webdav::{
    DavEntry, DavListing, Depth, WebDavClient, decode_path, encode_path, parse_multistatus_bytes,
    parse_multistatus_stream,
};
