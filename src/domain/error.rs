use thiserror::Error;

/// Why a relay run ended in `failed`. Only logged, never sent to the page.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid beatmapset id: {0}")]
    InvalidId(String),

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Mirror returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Response body unreadable: {0}")]
    Stream(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Save failed: {0}")]
    Save(#[from] SaveError),
}

/// The three ways a download can fail, as far as anyone outside the relay
/// needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No usable response: bad id, transport error, non-OK status
    Network,
    Stream,
    /// Reassembly, encoding or the save that follows
    Encoding,
}

impl RelayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RelayError::InvalidId(_) | RelayError::Network(_) | RelayError::Status(_) => {
                FailureKind::Network
            }
            RelayError::Stream(_) => FailureKind::Stream,
            RelayError::Encoding(_) | RelayError::Save(_) => FailureKind::Encoding,
        }
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Payload is not a base64 data URI")]
    InvalidPayload,

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Invalid beatmapset id: {0}")]
    InvalidInput(String),

    #[error("Relay unavailable")]
    RelayClosed,

    #[error("Download failed")]
    DownloadFailed,

    #[error("Packaging error: {0}")]
    Package(String),
}
