//! Errors raised while talking to the generation backend.

use thiserror::Error;

/// Failure of a single collaborator call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// User-facing failure of an upload or generation operation.
///
/// Every variant maps to exactly one notice; none of them is fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Please sign in to generate thumbnails")]
    AuthRequired,
    #[error("Please purchase more credits to continue.")]
    InsufficientCredits,
    #[error("Please upload an image first")]
    MissingReference,
    #[error("Failed to upload image: {0}")]
    Upload(String),
    #[error("Failed to generate thumbnail: {0}")]
    Submission(String),
    #[error("There was an error processing your image. Please try again.")]
    RemoteProcessing,
}

impl GenerationError {
    /// Persistent notices stay on screen until the user closes them.
    pub fn is_persistent(&self) -> bool {
        matches!(self, GenerationError::RemoteProcessing)
    }
}
