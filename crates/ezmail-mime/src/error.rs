//! Error types for MIME operations.

use std::path::PathBuf;
use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Attachment source could not be read.
    #[error("Unable to read attachment {}: {source}", path.display())]
    Attachment {
        /// Source path of the attachment.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Text destined for a header line contains a CR or LF.
    #[error("Line break in {field}")]
    LineBreak {
        /// Message part the text came from.
        field: &'static str,
    },

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),
}
