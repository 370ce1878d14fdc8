//! Error types for ISAPI payload decoding.

use thiserror::Error;

/// Errors raised when a vendor payload cannot be decoded at all.
///
/// Field-level problems (a channel without a `resDesc`, a status entry
/// without an `online` flag) are not errors; they surface as `None` fields
/// on the decoded observation.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The XML document is not well formed.
    #[error("malformed XML payload: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The JSON document is not well formed.
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The working-status document carried neither of the two accepted
    /// top-level shapes.
    #[error("working status payload has no ChanStatus array")]
    MissingChanStatus,
}

pub type Result<T> = std::result::Result<T, ParseError>;
