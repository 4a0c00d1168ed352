//! Message decoding errors.
//!
//! Every variant carries the offending raw line so an operator can find
//! the bad input in the upstream tap's output.

/// Fatal failure to turn one input line into a [`Message`](crate::Message).
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The line is not valid JSON.
    #[error("Unable to parse line as JSON: {source}\n{line}")]
    InvalidJson {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    /// The line parsed, but is not a JSON object.
    #[error("Line is not a JSON object: {line}")]
    NotAnObject { line: String },

    /// The `type` discriminator is absent.
    #[error("Line is missing required key 'type': {line}")]
    MissingType { line: String },

    /// The `type` discriminator names no known message kind.
    #[error("Unknown message type {message_type} in message {line}")]
    UnknownType { message_type: String, line: String },

    /// A field the message kind requires is absent.
    #[error("Line is missing required key '{field}': {line}")]
    MissingField { field: &'static str, line: String },

    /// A field is present with the wrong JSON shape.
    #[error("Field '{field}' must be {expected}: {line}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
        line: String,
    },
}

impl DecodeError {
    /// The raw input line that failed to decode.
    #[must_use]
    pub fn line(&self) -> &str {
        match self {
            Self::InvalidJson { line, .. }
            | Self::NotAnObject { line }
            | Self::MissingType { line }
            | Self::UnknownType { line, .. }
            | Self::MissingField { line, .. }
            | Self::InvalidField { line, .. } => line,
        }
    }
}
