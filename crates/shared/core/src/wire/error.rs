use thiserror::Error;

/// Protocol-level errors (malformed input, missing tags)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed field: '{0}'")]
    MalformedField(String),

    #[error("Missing required tag {0}")]
    MissingTag(String),
}
