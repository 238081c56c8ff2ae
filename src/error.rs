//! Error types for session operations.
//!
//! Every variant is surfaced to the user through the status line; `kind()`
//! decides how loudly.

use crate::model::RECORD_COUNT;
use thiserror::Error;

/// How an error should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; shown inline, retry immediately.
    User,
    /// External failure; shown as a warning, state untouched.
    Recoverable,
    /// Programming error that normal UI flow should never reach.
    Fatal,
}

#[derive(Error, Debug)]
pub enum Error {
    /// Confirm was pressed on a record without a name.
    #[error("name required: enter a location name before confirming")]
    NameRequired,

    /// The geocoder had no match for the query.
    #[error("location not found: \"{query}\", try a more detailed name")]
    LocationNotFound {
        /// The query as submitted.
        query: String,
    },

    /// The geocoder could not be reached or answered with garbage.
    #[error("search unavailable, try again later ({reason})")]
    SearchUnavailable {
        /// Description of the underlying failure.
        reason: String,
    },

    /// A record index outside the fixed slot range.
    #[error("record index {index} out of range (0..{max})", max = RECORD_COUNT)]
    OutOfRange {
        /// The offending index.
        index: usize,
    },

    /// Building the workbook failed.
    #[error("export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

/// A specialized Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NameRequired | Self::LocationNotFound { .. } => ErrorKind::User,
            Self::SearchUnavailable { .. } | Self::Export(_) => ErrorKind::Recoverable,
            Self::OutOfRange { .. } => ErrorKind::Fatal,
        }
    }

    #[must_use]
    pub fn search_unavailable(reason: impl Into<String>) -> Self {
        Self::SearchUnavailable {
            reason: reason.into(),
        }
    }
}
