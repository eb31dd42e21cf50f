/*!
    Error types for the avsync crate ecosystem.
*/

use std::fmt;

/**
    Error type for the avsync crate ecosystem.
*/
#[derive(Debug)]
pub enum Error {
    /// I/O error (file not found, disk full, etc.)
    Io(std::io::Error),
    /// Codec error (decode/encode/mux failure)
    Codec { message: String },
    /// Invalid data (malformed input)
    InvalidData { message: String },
    /// Unsupported format (valid but not handled)
    UnsupportedFormat { message: String },
    /// A source video frame timestamp regressed below its predecessor.
    ///
    /// This is the one session-ending condition: the container is closed
    /// and flushed before this error is surfaced, so everything written
    /// up to the last good frame stays playable.
    NonMonotonicTimestamp { last: f64, given: f64 },
    /// Unknown timestamp ledger export format string.
    UnknownExportFormat { format: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Codec { message } => write!(f, "codec error: {message}"),
            Self::InvalidData { message } => write!(f, "invalid data: {message}"),
            Self::UnsupportedFormat { message } => write!(f, "unsupported format: {message}"),
            Self::NonMonotonicTimestamp { last, given } => write!(
                f,
                "non-monotonic timestamps: last timestamp {last}, given timestamp {given}"
            ),
            Self::UnknownExportFormat { format } => {
                write!(f, "unknown timestamp export format `{format}`")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl Error {
    /**
        Create a codec error with the given message.
    */
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /**
        Create an invalid data error with the given message.
    */
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /**
        Create an unsupported format error with the given message.
    */
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /**
        Returns true if this is a source timestamp regression.
    */
    pub fn is_non_monotonic(&self) -> bool {
        matches!(self, Self::NonMonotonicTimestamp { .. })
    }
}

/**
    Result type alias for the avsync crate ecosystem.
*/
pub type Result<T> = std::result::Result<T, Error>;
