//! Singer message model and line decoder.
//!
//! Each input line is one JSON object tagged by `type`. Only `SCHEMA`,
//! `RECORD` and `STATE` are recognised; anything else is a fatal decode
//! error rather than something to skip.

use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::stream::StreamName;

/// One decoded line of the input stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Schema(SchemaMessage),
    Record(RecordMessage),
    State(StateMessage),
}

impl Message {
    /// Wire discriminator for this message kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema(_) => "SCHEMA",
            Self::Record(_) => "RECORD",
            Self::State(_) => "STATE",
        }
    }

    /// Stream the message belongs to, if the kind is stream-scoped.
    #[must_use]
    pub fn stream(&self) -> Option<&StreamName> {
        match self {
            Self::Schema(m) => Some(&m.stream),
            Self::Record(m) => Some(&m.stream),
            Self::State(_) => None,
        }
    }
}

/// Declares (or re-declares) the shape of a stream's records.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMessage {
    pub stream: StreamName,
    /// JSON Schema document; compiled by the engine, not checked here.
    pub schema: Value,
    /// `None` when the line omitted the key. The engine rejects that.
    pub key_properties: Option<Vec<String>>,
    pub bookmark_properties: Vec<String>,
}

/// One data row for a previously declared stream.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMessage {
    pub stream: StreamName,
    pub record: Map<String, Value>,
    pub time_extracted: Option<String>,
}

/// Opaque checkpoint to hand back to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMessage {
    pub value: Value,
}

/// Decode one input line into a [`Message`].
///
/// # Errors
///
/// Returns a [`DecodeError`] carrying the raw line when the line is not a
/// JSON object, lacks or misnames its `type`, or is missing a field its
/// kind requires.
pub fn decode_line(line: &str) -> Result<Message, DecodeError> {
    let value: Value = serde_json::from_str(line).map_err(|source| DecodeError::InvalidJson {
        line: line.to_string(),
        source,
    })?;
    let Value::Object(mut object) = value else {
        return Err(DecodeError::NotAnObject {
            line: line.to_string(),
        });
    };

    let message_type = match object.get("type") {
        None => {
            return Err(DecodeError::MissingType {
                line: line.to_string(),
            })
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    match message_type.as_str() {
        "RECORD" => {
            let stream = take_stream(&mut object, line)?;
            let record = match object.remove("record") {
                Some(Value::Object(record)) => record,
                Some(_) => {
                    return Err(DecodeError::InvalidField {
                        field: "record",
                        expected: "a JSON object",
                        line: line.to_string(),
                    })
                }
                None => return Err(missing("record", line)),
            };
            let time_extracted = object
                .remove("time_extracted")
                .and_then(|v| v.as_str().map(str::to_owned));
            Ok(Message::Record(RecordMessage {
                stream,
                record,
                time_extracted,
            }))
        }
        "STATE" => {
            let value = object.remove("value").ok_or_else(|| missing("value", line))?;
            Ok(Message::State(StateMessage { value }))
        }
        "SCHEMA" => {
            let stream = take_stream(&mut object, line)?;
            let schema = object
                .remove("schema")
                .ok_or_else(|| missing("schema", line))?;
            let key_properties = object
                .remove("key_properties")
                .map(|v| string_list(v, "key_properties", line))
                .transpose()?;
            let bookmark_properties = object
                .remove("bookmark_properties")
                .map(|v| string_list(v, "bookmark_properties", line))
                .transpose()?
                .unwrap_or_default();
            Ok(Message::Schema(SchemaMessage {
                stream,
                schema,
                key_properties,
                bookmark_properties,
            }))
        }
        _ => Err(DecodeError::UnknownType {
            message_type,
            line: line.to_string(),
        }),
    }
}

fn missing(field: &'static str, line: &str) -> DecodeError {
    DecodeError::MissingField {
        field,
        line: line.to_string(),
    }
}

fn take_stream(object: &mut Map<String, Value>, line: &str) -> Result<StreamName, DecodeError> {
    match object.remove("stream") {
        Some(Value::String(s)) if !s.is_empty() => Ok(StreamName::new(s)),
        Some(_) => Err(DecodeError::InvalidField {
            field: "stream",
            expected: "a non-empty string",
            line: line.to_string(),
        }),
        None => Err(missing("stream", line)),
    }
}

fn string_list(value: Value, field: &'static str, line: &str) -> Result<Vec<String>, DecodeError> {
    let invalid = || DecodeError::InvalidField {
        field,
        expected: "an array of strings",
        line: line.to_string(),
    };
    let Value::Array(items) = value else {
        return Err(invalid());
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(invalid()),
        })
        .collect()
}
