use hyper::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::repository::config::{ConnectionConfig, RepositoryInstance};
use crate::repository::credentials::{Credential, CredentialStore};
use crate::repository::crypto::PasswordCipher;
use crate::repository::error::SessionError;
use crate::repository::listing::{Listing, map_entries, resolve_request_path};
use crate::repository::transport::{DavConnector, DavTransport, WebDavConnector};
use crate::webdav::path::decode_path;
use crate::webdav::types::DavListing;

enum SessionState<T> {
    Unauthenticated,
    Authenticated {
        transport: T,
        user_id: u64,
        username: String,
    },
}

/// Login, listing and download for one user against one repository instance.
///
/// A session starts unauthenticated; [`Session::login`] moves it to authenticated and
/// [`Session::reset`] moves it back. The host passes the user id into `login`, nothing is
/// read from ambient state.
pub struct Session<C: DavConnector = WebDavConnector> {
    instance: RepositoryInstance,
    config: ConnectionConfig,
    store: Arc<dyn CredentialStore>,
    cipher: Arc<dyn PasswordCipher>,
    connector: C,
    state: SessionState<C::Transport>,
}

impl Session<WebDavConnector> {
    /// Session talking to the instance's server over [`WebDavClient`](crate::WebDavClient).
    pub fn new(
        instance: RepositoryInstance,
        store: Arc<dyn CredentialStore>,
        cipher: Arc<dyn PasswordCipher>,
    ) -> Result<Self, SessionError> {
        Self::with_connector(instance, store, cipher, WebDavConnector)
    }
}

impl<C: DavConnector> Session<C> {
    /// Fails with [`SessionError::InvalidConfig`] when the instance URL cannot be parsed.
    pub fn with_connector(
        instance: RepositoryInstance,
        store: Arc<dyn CredentialStore>,
        cipher: Arc<dyn PasswordCipher>,
        connector: C,
    ) -> Result<Self, SessionError> {
        let config = instance.connection_config()?;
        Ok(Self {
            instance,
            config,
            store,
            cipher,
            connector,
            state: SessionState::Unauthenticated,
        })
    }

    /// Replace the connection configuration, e.g. to change the request timeout.
    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn instance(&self) -> &RepositoryInstance {
        &self.instance
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    /// Username of the authenticated session, if any.
    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username, .. } => Some(username),
            SessionState::Unauthenticated => None,
        }
    }

    /// Forget the open connection. Cached credentials are left in place.
    pub fn reset(&mut self) {
        if self.is_authenticated() {
            info!(instance = self.instance.id, "session reset");
        }
        self.state = SessionState::Unauthenticated;
    }

    /// Authenticate `user_id`, preferring a cached credential over the supplied one.
    ///
    /// The root folder is listed as a liveness check. A `401`, or a root reported as not
    /// found, purges the cached credential that was tried and fails with
    /// [`SessionError::AuthenticationFailed`]. On success a credential that was not cached
    /// yet is encrypted and stored. Calling this on an authenticated session is a no-op.
    pub async fn login(
        &mut self,
        user_id: u64,
        supplied_username: Option<&str>,
        supplied_password: Option<&str>,
    ) -> Result<(), SessionError> {
        if self.is_authenticated() {
            return Ok(());
        }

        let cached = self.cached_login(user_id)?;
        let from_cache = cached.is_some();
        let (username, password) = match cached {
            Some(pair) => pair,
            None => match (supplied_username, supplied_password) {
                (Some(u), Some(p)) if !u.is_empty() => (u.to_string(), p.to_string()),
                _ => {
                    debug!(user_id, "no cached or supplied credentials");
                    return Err(SessionError::AuthenticationFailed {
                        username: supplied_username.unwrap_or_default().to_string(),
                    });
                }
            },
        };

        let transport = self
            .connector
            .connect(&self.config, &username, &password)
            .map_err(|err| SessionError::transfer("opening WebDAV connection", err))?;

        let root = format!("{}/", self.config.root_path());
        let probe = transport
            .list(&root)
            .await
            .map_err(|err| SessionError::transfer(format!("listing {root}"), err))?;

        if rejects_login(&probe) {
            if from_cache {
                let removed = self.store.delete(self.instance.id, user_id, &username)?;
                warn!(
                    instance = self.instance.id,
                    user_id,
                    username = %username,
                    removed,
                    "cached credential rejected, purged"
                );
            }
            return Err(SessionError::AuthenticationFailed { username });
        }
        if !probe.status.is_success() {
            return Err(SessionError::transfer(
                format!("listing {root}"),
                anyhow::anyhow!("server answered {}", probe.status),
            ));
        }

        if !from_cache {
            let encrypted = self.cipher.encrypt(&password, &self.instance.name)?;
            self.store.insert(Credential {
                instance_id: self.instance.id,
                user_id,
                username: username.clone(),
                password: encrypted,
            })?;
            debug!(instance = self.instance.id, user_id, "cached new credential");
        }

        info!(instance = self.instance.id, user_id, username = %username, "logged in");
        self.state = SessionState::Authenticated {
            transport,
            user_id,
            username,
        };
        Ok(())
    }

    /// Cached (username, password) for the user. A record that no longer decrypts is
    /// purged and reported as absent.
    fn cached_login(&self, user_id: u64) -> Result<Option<(String, String)>, SessionError> {
        let Some(record) = self.store.get(self.instance.id, user_id)? else {
            return Ok(None);
        };
        match self.cipher.decrypt(&record.password, &self.instance.name) {
            Ok(password) => Ok(Some((record.username, password))),
            Err(err) => {
                warn!(
                    instance = self.instance.id,
                    user_id,
                    error = %err,
                    "cached credential does not decrypt, purging"
                );
                self.store.delete(self.instance.id, user_id, &record.username)?;
                Ok(None)
            }
        }
    }

    fn transport(&self) -> Result<&C::Transport, SessionError> {
        match &self.state {
            SessionState::Authenticated { transport, .. } => Ok(transport),
            SessionState::Unauthenticated => Err(SessionError::NotAuthenticated),
        }
    }

    /// List the folder at `path` (relative to the root path; empty means the root).
    ///
    /// A `401` purges the user's cached credential, drops the session back to
    /// unauthenticated and fails with [`SessionError::AuthenticationFailed`].
    pub async fn list_directory(&mut self, path: &str) -> Result<Listing, SessionError> {
        let (requested, breadcrumbs) = resolve_request_path(path);
        let target = format!("{}{}", self.config.root_path(), requested);

        let listing = self
            .transport()?
            .list(&target)
            .await
            .map_err(|err| SessionError::transfer(format!("listing {target}"), err))?;

        if listing.is_unauthorized() {
            let state = std::mem::replace(&mut self.state, SessionState::Unauthenticated);
            let SessionState::Authenticated {
                user_id, username, ..
            } = state
            else {
                return Err(SessionError::NotAuthenticated);
            };
            let removed = self.store.delete(self.instance.id, user_id, &username)?;
            warn!(
                instance = self.instance.id,
                user_id,
                username = %username,
                removed,
                "credential rejected while listing, session dropped"
            );
            return Err(SessionError::AuthenticationFailed { username });
        }
        if !listing.status.is_success() {
            return Err(SessionError::transfer(
                format!("listing {target}"),
                anyhow::anyhow!("server answered {}", listing.status),
            ));
        }

        let entries = map_entries(
            &requested,
            listing.entries,
            self.config.root_path(),
            self.config.host(),
        );
        debug!(path = %requested, entries = entries.len(), "listed folder");
        Ok(Listing {
            path: breadcrumbs,
            entries,
        })
    }

    /// Download the file at `relative_url` (as found in a listing `href`, possibly still
    /// percent-encoded) into `destination`.
    pub async fn fetch_file(
        &self,
        relative_url: &str,
        destination: impl AsRef<Path>,
    ) -> Result<PathBuf, SessionError> {
        let transport = self.transport()?;
        let destination = destination.as_ref();
        let source = format!("{}{}", self.config.root_path(), decode_path(relative_url));

        let written = transport
            .download(&source, destination)
            .await
            .map_err(|err| SessionError::transfer(format!("downloading {source}"), err))?;
        info!(source = %source, bytes = written, "fetched file");
        Ok(destination.to_path_buf())
    }
}

fn rejects_login(probe: &DavListing) -> bool {
    probe.status == StatusCode::UNAUTHORIZED
        || probe.status == StatusCode::NOT_FOUND
        || probe.entries.iter().any(|entry| entry.is_not_found())
}
