//! Sequential Singer message state machine.
//!
//! The processor owns the schema registry and the pending checkpoint and
//! applies messages strictly in input order:
//!
//! - `SCHEMA` compiles and stores (or replaces) the stream's validator.
//! - `RECORD` validates against the current validator, maps the record to
//!   an `identify` payload, sends it, then clears the checkpoint.
//! - `STATE` replaces the checkpoint.
//!
//! Any [`ProcessError`] stops processing. A failed delivery does not: it is
//! logged, counted, and the record is not retried.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use userpilot_types::{decode_line, DecodeError, Message, RecordMessage, SchemaMessage};

use crate::delivery::Delivery;
use crate::error::ProcessError;
use crate::registry::SchemaRegistry;
use crate::transform;

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub schemas_registered: u64,
    pub records_delivered: u64,
    pub delivery_failures: u64,
    pub states_received: u64,
}

pub struct StreamProcessor<D> {
    registry: SchemaRegistry,
    state: Option<Value>,
    delivery: D,
    stats: ProcessStats,
}

impl<D: Delivery> StreamProcessor<D> {
    pub fn new(delivery: D) -> Self {
        Self {
            registry: SchemaRegistry::new(),
            state: None,
            delivery,
            stats: ProcessStats::default(),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Checkpoint that would be emitted if input ended now.
    pub fn state(&self) -> Option<&Value> {
        self.state.as_ref()
    }

    pub fn stats(&self) -> ProcessStats {
        self.stats
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Apply one message.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] for a schema without `key_properties`, a
    /// schema that does not compile, a record for an undeclared stream, a
    /// record that fails validation, or a record missing a mapped field.
    pub async fn process_message(&mut self, message: Message) -> Result<(), ProcessError> {
        match message {
            Message::Schema(schema) => self.apply_schema(schema),
            Message::Record(record) => self.apply_record(record).await,
            Message::State(state) => {
                tracing::debug!(state = %state.value, "Setting state");
                self.state = Some(state.value);
                self.stats.states_received += 1;
                Ok(())
            }
        }
    }

    /// Apply every message in order and return the final checkpoint.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first [`ProcessError`].
    pub async fn process<I>(&mut self, messages: I) -> Result<Option<Value>, ProcessError>
    where
        I: IntoIterator<Item = Message>,
    {
        for message in messages {
            self.process_message(message).await?;
        }
        Ok(self.state.clone())
    }

    /// Decode and apply newline-delimited messages until end of input, and
    /// return the final checkpoint.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first read, decode, or processing error.
    pub async fn process_lines<R>(&mut self, reader: R) -> Result<Option<Value>, ProcessError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let message = match decode_line(&line) {
                Ok(message) => message,
                Err(e) => {
                    // Well-formed lines with a bad shape are described by the
                    // error itself.
                    if matches!(e, DecodeError::InvalidJson { .. }) {
                        tracing::error!(line = %line, "Unable to parse input line");
                    }
                    return Err(e.into());
                }
            };
            tracing::trace!(
                kind = message.kind(),
                stream = message.stream().map(|s| s.as_str()),
                "Applying message"
            );
            self.process_message(message).await?;
        }

        tracing::info!(
            schemas = self.stats.schemas_registered,
            records_delivered = self.stats.records_delivered,
            delivery_failures = self.stats.delivery_failures,
            states = self.stats.states_received,
            "Input exhausted"
        );
        Ok(self.state.clone())
    }

    fn apply_schema(&mut self, message: SchemaMessage) -> Result<(), ProcessError> {
        let SchemaMessage {
            stream,
            schema,
            key_properties,
            ..
        } = message;
        let key_properties = key_properties.ok_or_else(|| ProcessError::MissingKeyProperties {
            stream: stream.clone(),
        })?;

        tracing::debug!(
            stream = stream.as_str(),
            key_properties = ?key_properties,
            "Registering schema"
        );
        let changed = self
            .registry
            .get(stream.as_str())
            .is_some_and(|current| current.schema() != &schema);
        let replaced = self.registry.register(stream.clone(), schema, key_properties)?;
        if replaced {
            tracing::info!(stream = stream.as_str(), changed, "Schema replaced for stream");
        }
        self.stats.schemas_registered += 1;
        Ok(())
    }

    async fn apply_record(&mut self, message: RecordMessage) -> Result<(), ProcessError> {
        let stream = message.stream;
        let record = Value::Object(message.record);

        self.registry.validate(&stream, &record)?;
        let payload = transform::to_identify_payload(&record).map_err(|source| {
            ProcessError::Transform {
                stream: stream.clone(),
                source,
            }
        })?;

        match self.delivery.deliver(&payload).await {
            Ok(receipt) => {
                self.stats.records_delivered += 1;
                tracing::debug!(
                    stream = stream.as_str(),
                    user_id = payload.user_id.as_str(),
                    status = receipt.status,
                    "Record delivered"
                );
            }
            Err(e) => {
                self.stats.delivery_failures += 1;
                tracing::warn!(
                    stream = stream.as_str(),
                    user_id = payload.user_id.as_str(),
                    error = %e,
                    "Delivery to Userpilot failed; record will not be retried"
                );
            }
        }

        // State covers only what came before the record; a new STATE message
        // must follow for it to be emitted again.
        self.state = None;
        Ok(())
    }
}
