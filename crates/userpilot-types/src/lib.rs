//! Shared Singer protocol and Userpilot payload types.
//!
//! Kept free of I/O so the engine, the CLI, and tests can share them
//! without pulling in the HTTP or validation stacks.

pub mod error;
pub mod message;
pub mod payload;
pub mod stream;

pub use error::DecodeError;
pub use message::{decode_line, Message, RecordMessage, SchemaMessage, StateMessage};
pub use payload::{IdentifyMetadata, IdentifyPayload};
pub use stream::StreamName;
