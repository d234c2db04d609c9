//! Observability for the bucket tool
//!
//! Structured JSON log lines with typed event names. There is no global
//! logger: every component receives a `Logger` value at construction.

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
