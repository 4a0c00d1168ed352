//! Core of `target-userpilot`.
//!
//! Reads Singer messages, validates records against their stream's JSON
//! Schema, maps them onto Userpilot `identify` calls, and hands the last
//! checkpoint back to the orchestrator.

pub mod config;
pub mod delivery;
pub mod error;
pub mod orchestrator;
pub mod processor;
pub mod registry;
pub mod state;
pub mod telemetry;
pub mod transform;

pub use config::Config;
pub use delivery::{Delivery, DeliveryError, DeliveryReceipt, UserpilotClient};
pub use error::ProcessError;
pub use processor::{ProcessStats, StreamProcessor};
pub use registry::{SchemaRegistry, Violation};
