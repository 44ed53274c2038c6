use thiserror::Error;

/// Failure of a [`Session`](crate::repository::Session) operation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configured WebDAV URL cannot be used.
    #[error("invalid repository configuration: {0}")]
    InvalidConfig(String),

    /// The server rejected the credentials (401) or the root folder was not found (404).
    #[error("authentication failed for user {username:?}")]
    AuthenticationFailed { username: String },

    /// An operation that needs a session ran before a successful login.
    #[error("not authenticated: call login first")]
    NotAuthenticated,

    /// Network, protocol or local I/O failure.
    #[error("transfer failed: {context}")]
    TransferError {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("credential store error: {0}")]
    CredentialStore(#[from] StoreError),

    #[error("credential encryption error: {0}")]
    Crypto(#[from] CryptoError),
}

impl SessionError {
    pub(crate) fn transfer(context: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        SessionError::TransferError {
            context: context.into(),
            source: source.into(),
        }
    }

    /// True for failures the host should answer by prompting for credentials again.
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            SessionError::AuthenticationFailed { .. } | SessionError::NotAuthenticated
        )
    }
}

/// Failure of a [`CredentialStore`](crate::repository::CredentialStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed credential file: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("could not replace credential file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("credential store lock poisoned")]
    Poisoned,
}

/// Failure of a [`PasswordCipher`](crate::repository::PasswordCipher).
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("ciphertext header missing or truncated")]
    InvalidFormat,

    #[error("cipher operation failed")]
    Cipher,

    #[error("decrypted password is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
