//! wgwizard Error Types

use thiserror::Error;

/// Result type alias for wgwizard operations
pub type Result<T> = std::result::Result<T, Error>;

/// wgwizard error types
#[derive(Error, Debug)]
pub enum Error {
    // Field validation errors
    #[error("Invalid IPv4 address: '{0}'")]
    InvalidIpv4(String),

    #[error("Invalid netmask: '{0}'")]
    InvalidNetmask(String),

    #[error("Invalid listen port: '{0}' (expected 1-65535)")]
    InvalidPort(String),

    #[error("Invalid interface name: '{0}' (expected wg0 - wg255)")]
    InvalidInterfaceName(String),

    #[error("Invalid keepalive interval: '{0}' (expected 1-65535 seconds)")]
    InvalidKeepalive(String),

    #[error("Invalid endpoint: '{0}' (expected hostname, IPv4 or IPv6 address)")]
    InvalidEndpoint(String),

    #[error("Invalid peer name: '{0}'")]
    InvalidPeerName(String),

    /// A field error located in a run file
    #[error("{peer} {field}: {source}")]
    Field {
        peer: String,
        field: String,
        #[source]
        source: Box<Error>,
    },

    // Key errors
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ipnet::PrefixLenError> for Error {
    fn from(e: ipnet::PrefixLenError) -> Self {
        Error::InvalidNetmask(e.to_string())
    }
}

impl Error {
    /// Attach the peer and field a validation error came from
    pub fn at(peer: impl Into<String>, field: impl Into<String>, source: Error) -> Self {
        Error::Field {
            peer: peer.into(),
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// The underlying error, with any field location stripped
    pub fn root(&self) -> &Error {
        match self {
            Error::Field { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if the caller can recover by asking for the field again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.root(),
            Error::InvalidIpv4(_)
                | Error::InvalidNetmask(_)
                | Error::InvalidPort(_)
                | Error::InvalidInterfaceName(_)
                | Error::InvalidKeepalive(_)
                | Error::InvalidEndpoint(_)
                | Error::InvalidPeerName(_)
                | Error::InvalidKey(_)
                | Error::Config(_)
                | Error::ConfigParse(_)
        )
    }

    /// Check if this error must abort the whole generation run
    pub fn is_fatal(&self) -> bool {
        matches!(self.root(), Error::KeyGenerationFailed(_))
    }
}
