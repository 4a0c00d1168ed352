//! Per-stream schema registry.
//!
//! Holds the latest SCHEMA declaration for each stream together with a
//! compiled Draft 4 validator. A re-declaration replaces the entry outright;
//! records are always checked against whatever entry is current when they
//! arrive.

use std::collections::HashMap;

use jsonschema::{Draft, Validator};
use serde_json::Value;
use userpilot_types::StreamName;

use crate::error::ProcessError;

/// One schema violation found in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer into the record (empty for the record root).
    pub instance_path: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.instance_path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Current declaration for a single stream.
pub struct StreamSchema {
    schema: Value,
    key_properties: Vec<String>,
    validator: Validator,
}

impl StreamSchema {
    fn compile(stream: &StreamName, schema: Value, key_properties: Vec<String>) -> Result<Self, ProcessError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft4)
            .build(&schema)
            .map_err(|e| ProcessError::InvalidSchema {
                stream: stream.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            schema,
            key_properties,
            validator,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    #[must_use]
    pub fn key_properties(&self) -> &[String] {
        &self.key_properties
    }

    /// Every violation of this schema in `record`, in validator order.
    #[must_use]
    pub fn violations(&self, record: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(record)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }
}

impl std::fmt::Debug for StreamSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSchema")
            .field("schema", &self.schema)
            .field("key_properties", &self.key_properties)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    streams: HashMap<StreamName, StreamSchema>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `schema` and make it the current declaration for `stream`.
    ///
    /// Returns `true` if an earlier declaration was replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvalidSchema`] if `schema` does not compile.
    /// The previous entry, if any, is left in place in that case.
    pub fn register(
        &mut self,
        stream: StreamName,
        schema: Value,
        key_properties: Vec<String>,
    ) -> Result<bool, ProcessError> {
        let entry = StreamSchema::compile(&stream, schema, key_properties)?;
        Ok(self.streams.insert(stream, entry).is_some())
    }

    #[must_use]
    pub fn get(&self, stream: &str) -> Option<&StreamSchema> {
        self.streams.get(stream)
    }

    #[must_use]
    pub fn key_properties(&self, stream: &str) -> Option<&[String]> {
        self.get(stream).map(StreamSchema::key_properties)
    }

    /// Check `record` against the current schema for `stream`.
    ///
    /// # Errors
    ///
    /// [`ProcessError::UndeclaredStream`] if no schema was registered for
    /// `stream`; [`ProcessError::SchemaViolation`] if the record does not
    /// conform.
    pub fn validate(&self, stream: &StreamName, record: &Value) -> Result<(), ProcessError> {
        let entry = self
            .get(stream.as_str())
            .ok_or_else(|| ProcessError::UndeclaredStream {
                stream: stream.clone(),
            })?;
        let violations = entry.violations(record);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ProcessError::SchemaViolation {
                stream: stream.clone(),
                violations,
            })
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
