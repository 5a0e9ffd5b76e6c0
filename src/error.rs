use thiserror::Error;

/// Errors that can occur when using the gengate library.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no generation configuration is stored")]
    ConfigMissing,

    #[error("no API key configured for provider '{provider}'")]
    CredentialMissing { provider: String },

    #[error("provider '{0}' is not registered")]
    UnsupportedProvider(String),

    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown session '{0}'")]
    UnknownSession(String),
}

impl Error {
    pub fn credential_missing(provider: impl Into<String>) -> Self {
        Error::CredentialMissing {
            provider: provider.into(),
        }
    }

    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            body: body.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport(message.into())
    }
}
