pub mod error;
pub mod model;

pub use error::{AppError, FailureKind, RelayError, SaveError};
pub use model::{percent, ChunkBuffer, DownloadPhase, DownloadRequest, Message, ProgressEvent};
