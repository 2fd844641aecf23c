//! Chat-command surface over the subscription store.
//!
//! Commands are plain functions from a resolved session context to reply
//! text; the host command framework owns parsing and delivery of replies.
//! Every outcome, including user errors and storage failures, is reported
//! as text — commands never surface an error to the framework.

pub mod session_context;
pub mod subscription_commands;

pub use session_context::*;
pub use subscription_commands::*;
