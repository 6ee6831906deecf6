//! Stdin payload processing for hook invocations

mod processor;

pub use processor::{DecodedPayload, StdinProcessor};
