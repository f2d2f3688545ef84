//! Event model for tool invocations
//!
//! Every invocation produces an ordered sequence of events: exactly one
//! `Start`, any number of `Data`/`Progress`, then exactly one terminal
//! `End` or `Error`.

mod types;

#[cfg(test)]
mod tests;

pub use types::{
    DataPayload, EndPayload, ErrorPayload, Event, EventKind, EventPayload, ProgressPayload,
    StartPayload,
};
