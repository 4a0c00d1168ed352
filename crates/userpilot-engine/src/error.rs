//! Fatal processing errors.
//!
//! Any of these aborts the run before state is emitted. Delivery failures
//! are deliberately absent: see [`DeliveryError`](crate::delivery::DeliveryError).

use userpilot_types::{DecodeError, StreamName};

use crate::registry::Violation;
use crate::transform::TransformError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("A record for stream {stream} was encountered before a corresponding schema")]
    UndeclaredStream { stream: StreamName },

    #[error("key_properties field is required (stream {stream})")]
    MissingKeyProperties { stream: StreamName },

    #[error("Schema for stream {stream} is not a valid JSON Schema: {message}")]
    InvalidSchema { stream: StreamName, message: String },

    #[error("Record for stream {stream} failed schema validation: {}", join_violations(.violations))]
    SchemaViolation {
        stream: StreamName,
        violations: Vec<Violation>,
    },

    #[error("Record for stream {stream} cannot be sent to Userpilot: {source}")]
    Transform {
        stream: StreamName,
        #[source]
        source: TransformError,
    },

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
