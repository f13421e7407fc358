//! Stream event wire protocol: type + payload + envelope.
//!
//! Defines the wire shape of one stream event and the envelope injected
//! around it. Does not depend on `agentship` — the core crate builds
//! `ProtocolEvent` values from its internal engine state and calls
//! [`to_json`] to produce the bytes written to the transport.

pub mod envelope;
pub mod event;

pub use envelope::{to_json, Envelope, EnvelopeState};
pub use event::ProtocolEvent;
