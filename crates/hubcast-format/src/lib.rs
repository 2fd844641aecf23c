//! Pure formatting of webhook event payloads into notification text.
//!
//! `render_event` maps an event type and its JSON payload to a short
//! human-readable message, or to an explicit absence when the event carries
//! nothing worth forwarding. Formatting never performs I/O and never fails
//! outward: malformed payloads degrade to "no message" with a logged warning.

pub mod event_render;

pub use event_render::*;
