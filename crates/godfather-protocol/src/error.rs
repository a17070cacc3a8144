//! Errors raised while (de)serializing records.
//!
//! A `ProtocolError` always means a record could not be turned into text
//! or read back. Network and storage failures have their own types in the
//! crates above.

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A record could not be serialized.
    #[error("could not encode record: {0}")]
    Encode(serde_json::Error),

    /// Stored text is not a valid record: written by an older client,
    /// truncated, or edited by hand.
    #[error("could not decode record: {0}")]
    Decode(serde_json::Error),

    /// Encoding produced something unusable, such as bytes that are not
    /// UTF-8 text.
    #[error("malformed record: {0}")]
    InvalidMessage(String),
}
