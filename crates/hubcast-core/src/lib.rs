//! Shared configuration model and event-type catalog for hubcast.

pub mod bridge_config;
pub mod event_catalog;

pub use bridge_config::*;
pub use event_catalog::*;
