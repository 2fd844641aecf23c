//! Webhook ingestion endpoint: signature verification, subscription
//! filtering, formatting, and dispatch over one inbound HTTP request.

pub mod webhook_server;
pub mod webhook_signature;

pub use webhook_server::*;
pub use webhook_signature::*;
