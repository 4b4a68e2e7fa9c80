//! Typed row shapes and request payloads.

pub mod event;
mod field;
pub mod payload;

pub use event::{DeviceEventRecord, EventRecord};
pub use payload::NewEvent;
